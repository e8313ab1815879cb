// ABOUTME: Per-thread completion parameters and their validated setters.
// ABOUTME: Every mutation goes through a setter that enforces the allowed bounds.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub const MAX_TOKENS_LIMIT: u32 = 4000;

/// Completion models a thread may be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Model {
    #[default]
    Davinci,
    Curie,
    Babbage,
    Ada,
}

impl Model {
    pub const ALL: [Model; 4] = [Model::Davinci, Model::Curie, Model::Babbage, Model::Ada];

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Davinci => "text-davinci-003",
            Model::Curie => "text-curie-001",
            Model::Babbage => "text-babbage-001",
            Model::Ada => "text-ada-001",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Model::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown model '{}'", s)))
    }
}

/// Completion settings attached to a thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParameters {
    pub model: Model,
    pub max_tokens: u32,
    pub temperature: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub top_p: f32,
}

impl Default for CompletionParameters {
    fn default() -> Self {
        Self {
            model: Model::default(),
            max_tokens: 400,
            temperature: 0.5,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            top_p: 1.0,
        }
    }
}

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<f32> {
    if value.is_nan() || value < min || value > max {
        return Err(Error::InvalidParameter(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(value)
}

impl CompletionParameters {
    pub fn set_model(&mut self, model: Model) {
        self.model = model;
    }

    pub fn set_max_tokens(&mut self, value: i64) -> Result<()> {
        if !(0..=MAX_TOKENS_LIMIT as i64).contains(&value) {
            return Err(Error::InvalidParameter(format!(
                "MaxTokens must be between 0 and {}, got {}",
                MAX_TOKENS_LIMIT, value
            )));
        }
        self.max_tokens = value as u32;
        Ok(())
    }

    pub fn set_temperature(&mut self, value: f32) -> Result<()> {
        self.temperature = check_range("Temperature", value, 0.0, 1.0)?;
        Ok(())
    }

    pub fn set_frequency_penalty(&mut self, value: f32) -> Result<()> {
        self.frequency_penalty = check_range("FrequencyPenalty", value, -2.0, 2.0)?;
        Ok(())
    }

    pub fn set_presence_penalty(&mut self, value: f32) -> Result<()> {
        self.presence_penalty = check_range("PressencePenalty", value, -2.0, 2.0)?;
        Ok(())
    }

    pub fn set_top_p(&mut self, value: f32) -> Result<()> {
        self.top_p = check_range("TopP", value, 0.0, 1.0)?;
        Ok(())
    }
}
