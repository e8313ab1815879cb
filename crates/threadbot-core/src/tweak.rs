// ABOUTME: Parser for the `key=value;...` grammar that adjusts thread completion settings.
// ABOUTME: Assignments apply to a copy; the first invalid one rejects the whole batch.

use crate::error::{Error, Result};
use crate::params::{CompletionParameters, Model};

/// Usage text for the tweak grammar, shown in help and on invalid input.
pub const TWEAK_PARAM_HELP: &str = "/tweak [<parameter>=<value>;]
Parameters:
    Model:            <text-davinci-003|text-curie-001|text-babbage-001|text-ada-001>
    MaxTokens:        < 0 - 4000 >
    Temperature:      < 0.00 - 1.00 >
    FrequencyPenalty: < -2.00 - 2.00 >
    PressencePenalty: < -2.00 - 2.00 >
    TopP:             < 0.00 - 1.00 >
";

fn parse_float(name: &str, value: &str) -> Result<f32> {
    value
        .parse::<f32>()
        .map_err(|e| Error::InvalidParameter(format!("{}: {}", name, e)))
}

fn apply_one(settings: &mut CompletionParameters, name: &str, value: &str) -> Result<()> {
    match name {
        "Model" => settings.set_model(value.parse::<Model>()?),
        "MaxTokens" => {
            let tokens = value
                .parse::<i64>()
                .map_err(|e| Error::InvalidParameter(format!("{}: {}", name, e)))?;
            settings.set_max_tokens(tokens)?;
        }
        "Temperature" => settings.set_temperature(parse_float(name, value)?)?,
        "FrequencyPenalty" => settings.set_frequency_penalty(parse_float(name, value)?)?,
        "PressencePenalty" => settings.set_presence_penalty(parse_float(name, value)?)?,
        "TopP" => settings.set_top_p(parse_float(name, value)?)?,
        other => {
            return Err(Error::InvalidParameter(format!(
                "unknown parameter '{}'",
                other
            )))
        }
    }
    Ok(())
}

/// Apply a tweak expression to `current`, returning the updated settings.
///
/// `current` is left untouched; callers store the result only on success.
/// A single trailing `;` is allowed.
pub fn apply(current: &CompletionParameters, input: &str) -> Result<CompletionParameters> {
    let mut settings = *current;
    let body = input.trim();
    let body = body.strip_suffix(';').unwrap_or(body);

    for assignment in body.split(';') {
        let parts: Vec<&str> = assignment.trim().split('=').collect();
        let [name, value] = parts.as_slice() else {
            return Err(Error::InvalidParameter(format!(
                "expected <parameter>=<value>, got '{}'",
                assignment.trim()
            )));
        };
        apply_one(&mut settings, name.trim(), value.trim())?;
    }

    Ok(settings)
}
