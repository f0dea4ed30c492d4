use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use super::http_client;
use crate::kernel::config::FactotumConfig;
use crate::kernel::task_log::log_task;
use crate::tools::{BoundArguments, ParamSchema, ParamType, Tool, ToolContext, ToolError, ToolOutput};

const HELP: &str = "\
Check the current price of a cryptocurrency.

Args:
    coin (str): The CoinGecko coin id to check. Defaults to 'bitcoin'.

Example:
    factotum --task check-crypto-price --coin ethereum

Fetches the real-time price from the CoinGecko simple price API and
shows it in the configured quote currency (crypto.currency, CAD by
default). Any coin id CoinGecko recognizes works, e.g. 'bitcoin',
'ethereum' or 'dogecoin'.";

/// Price lookup against CoinGecko's `/simple/price`.
pub struct CryptoPrice {
    client: reqwest::Client,
    api_base: String,
    currency: String,
}

pub fn load(config: &FactotumConfig) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
    Ok(vec![Arc::new(CryptoPrice {
        client: http_client(config)?,
        api_base: config.crypto.api_base.trim_end_matches('/').to_string(),
        currency: config.crypto.currency.to_lowercase(),
    })])
}

/// Pull `body[coin][currency]` out of a simple-price response.
pub fn parse_price(body: &JsonValue, coin: &str, currency: &str) -> Option<f64> {
    body.get(coin)?.get(currency)?.as_f64()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl Tool for CryptoPrice {
    fn name(&self) -> &str {
        "check_crypto_price"
    }

    fn parameters(&self) -> Vec<ParamSchema> {
        vec![ParamSchema::optional("coin", ParamType::String, "bitcoin", "Crypto coin id")]
    }

    fn help(&self) -> Option<&str> {
        Some(HELP)
    }

    async fn execute(&self, args: BoundArguments, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let coin = args.string("coin")?.trim().to_lowercase();
        if coin.is_empty() {
            return Err(ToolError::InvalidParams("coin must not be empty".to_string()));
        }

        let body: JsonValue = self
            .client
            .get(format!("{}/simple/price", self.api_base))
            .query(&[("ids", coin.as_str()), ("vs_currencies", self.currency.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(price) = parse_price(&body, &coin, &self.currency) else {
            return Err(ToolError::ExecutionError(format!(
                "Coin '{coin}' not found. Please check the coin ID."
            )));
        };

        let message = format!(
            "The current price of {} is: ${price:.2} {}",
            capitalize(&coin),
            self.currency.to_uppercase()
        );
        log_task(&message);

        Ok(ToolOutput::new(message).with_metadata(json!({
            "coin": coin,
            "currency": self.currency,
            "price": price,
        })))
    }
}
