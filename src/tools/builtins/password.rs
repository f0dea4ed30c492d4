use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::Rng;
use serde_json::json;

use crate::kernel::config::FactotumConfig;
use crate::kernel::task_log::log_task;
use crate::tools::{BoundArguments, ParamSchema, ParamType, Tool, ToolContext, ToolError, ToolOutput};

const LETTERS_AND_DIGITS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

pub const MAX_LENGTH: i64 = 4096;

const HELP: &str = "\
Generate a secure random password.

Args:
    length (int): The desired length of the password. Defaults to 12.
    specials (bool): Include special characters (like !@#). Use 'y' for yes. Defaults to false.

Example:
    factotum --task generate-password --length 16 --specials y

Creates a random password from upper and lowercase letters and digits,
optionally adding punctuation for extra strength. Characters are drawn
from the operating system's random source.";

pub struct PasswordGenerator;

pub fn load(_config: &FactotumConfig) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
    Ok(vec![Arc::new(PasswordGenerator)])
}

/// Draw `length` characters from the alphabet selected by `specials`.
pub fn generate<R: Rng + ?Sized>(length: usize, specials: bool, rng: &mut R) -> String {
    let mut alphabet: Vec<char> = LETTERS_AND_DIGITS.chars().collect();
    if specials {
        alphabet.extend(PUNCTUATION.chars());
    }
    (0..length).map(|_| alphabet[rng.gen_range(0..alphabet.len())]).collect()
}

#[async_trait]
impl Tool for PasswordGenerator {
    fn name(&self) -> &str {
        "generate_password"
    }

    fn parameters(&self) -> Vec<ParamSchema> {
        vec![
            ParamSchema::optional("length", ParamType::Integer, 12_i64, "Password length"),
            ParamSchema::optional("specials", ParamType::Boolean, false, "Include special characters (y/n)"),
        ]
    }

    fn help(&self) -> Option<&str> {
        Some(HELP)
    }

    async fn execute(&self, args: BoundArguments, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let length = args.integer("length")?;
        let specials = args.boolean("specials")?;
        if !(1..=MAX_LENGTH).contains(&length) {
            return Err(ToolError::InvalidParams(format!(
                "length must be between 1 and {MAX_LENGTH}, got {length}"
            )));
        }

        let password = generate(length as usize, specials, &mut OsRng);
        log_task(format!("Generated a {length}-character password (specials: {specials})"));

        Ok(ToolOutput::new(format!("Generated password: {password}"))
            .with_metadata(json!({ "length": length, "specials": specials })))
    }
}
