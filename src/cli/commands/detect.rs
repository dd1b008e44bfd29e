//! cli::commands::detect
//!
//! Show which candidate alphabets could have produced a value.

use anyhow::Result;

use crate::core::codec::{convert, examine_candidates, Alphabet, BASE36, BASE62, DECIMAL, HEX};
use crate::engine::Context;
use crate::ui::output;

/// Alphabets tried when none are given.
const DEFAULT_CANDIDATES: &[&str] = &[DECIMAL, HEX, BASE36, BASE62];

/// Print one verdict per candidate alphabet.
///
/// Accepted candidates also show the value in decimal when they are large
/// enough to convert with.
pub fn detect(ctx: &Context, value: &str, candidates: &[String]) -> Result<()> {
    let candidates: Vec<&str> = if candidates.is_empty() {
        DEFAULT_CANDIDATES.to_vec()
    } else {
        candidates.iter().map(String::as_str).collect()
    };

    let decimal = Alphabet::new(DECIMAL)?;
    let outcomes = examine_candidates(value, &candidates);
    let accepted = outcomes.iter().filter(|o| o.is_accepted()).count();
    output::debug(
        format!("{} of {} candidates accepted", accepted, outcomes.len()),
        ctx.verbosity,
    );

    for outcome in &outcomes {
        match &outcome.verdict {
            Ok(base) => match Alphabet::new(&outcome.candidate) {
                Ok(alphabet) => println!(
                    "#{} base {}: accepted, decimal {}",
                    outcome.index,
                    base,
                    convert(value, &alphabet, &decimal)?
                ),
                Err(_) => println!("#{} base {}: accepted", outcome.index, base),
            },
            Err(rejection) => println!(
                "#{} {:?}: rejected, {}",
                outcome.index, outcome.candidate, rejection
            ),
        }
    }
    Ok(())
}
