//! Prediction Client - run remote model predictions from the command line
//!
//! This is the CLI entry point for the prediction-client tool.
//! Run with: cargo run --bin prediction-client -- run owner/model:version prompt="hello"

use prediction_client::{AppSettings, ModelIdentifier, Prediction, PredictionClient};
use serde_json::{Map, Value};
use std::env;

const USAGE: &str = "\
Usage: prediction-client <command> [args]

Commands:
  run <path:version> [key=value ...]      Create a prediction and wait for its output
  watch <path:version> [key=value ...]    Like run, printing every status change
  create <path:version> [key=value ...]   Create a prediction and print it
  get <path:version> <id>                 Fetch a prediction
  status <path:version> <id>              Print a prediction's status
  wait <path:version> <id>                Poll a prediction until it finishes
  cancel <path:version> <id>              Cancel a prediction
  models                                  List models
  model <path>                            Show model metadata
  save-config                             Persist the current settings

Input values are parsed as JSON when possible, otherwise taken as strings.

Environment:
  PREDICTION_BASE_URL, PREDICTION_API_TOKEN,
  PREDICTION_POLL_INTERVAL_MS, PREDICTION_MAX_RETRIES";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    // Initialize tracing, honoring RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    // Settings file first, environment on top
    let settings = AppSettings::load().apply_env();
    let client = PredictionClient::new(settings.client_config());

    match command.as_str() {
        "run" => {
            let (model, inputs) = model_and_inputs(rest)?;
            match client.run(model, inputs).await? {
                Some(output) => print_json(&output)?,
                None => eprintln!("⚠️  Prediction finished without output"),
            }
        }
        "watch" => {
            let (model, inputs) = model_and_inputs(rest)?;
            let mut poller = client.stream(model, inputs)?;
            let mut last_status = None;
            let mut last = None;
            while let Some(snapshot) = poller.next().await {
                let prediction = snapshot?;
                if last_status.as_ref() != Some(&prediction.status) {
                    eprintln!("📡 {} {}", prediction.id, prediction.status);
                    last_status = Some(prediction.status.clone());
                }
                last = Some(prediction);
            }
            if let Some(prediction) = last {
                print_json(&prediction)?;
            }
        }
        "create" => {
            let (model, inputs) = model_and_inputs(rest)?;
            print_json(&client.create(model, inputs).await?)?;
        }
        "get" => print_json(&client.get(&prediction_ref(rest)?).await?)?,
        "status" => println!("{}", client.check_status(&prediction_ref(rest)?).await?),
        "wait" => print_json(&client.wait(prediction_ref(rest)?).await?)?,
        "cancel" => print_json(&client.cancel_prediction(&prediction_ref(rest)?).await?)?,
        "models" => print_json(&client.list_models().await?)?,
        "model" => {
            let path = rest
                .first()
                .ok_or_else(|| anyhow::anyhow!("missing model path\n\n{}", USAGE))?;
            print_json(&client.get_model(path).await?)?;
        }
        "save-config" => {
            let path = settings.save().map_err(anyhow::Error::msg)?;
            println!("✅ Settings saved to {}", path.display());
        }
        "help" | "--help" | "-h" => println!("{}", USAGE),
        other => anyhow::bail!("unknown command {:?}\n\n{}", other, USAGE),
    }

    Ok(())
}

fn model_and_inputs(args: &[String]) -> anyhow::Result<(&str, Value)> {
    let (model, pairs) = args
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("missing model identifier\n\n{}", USAGE))?;
    Ok((model.as_str(), parse_inputs(pairs)?))
}

fn prediction_ref(args: &[String]) -> anyhow::Result<Prediction> {
    match args {
        [model, id, ..] => Ok(Prediction::reference(id, &ModelIdentifier::parse(model)?)),
        _ => anyhow::bail!("expected <path:version> <id>\n\n{}", USAGE),
    }
}

/// Turn `key=value` arguments into an input object.
fn parse_inputs(pairs: &[String]) -> anyhow::Result<Value> {
    let mut inputs = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("input {:?} is not key=value", pair))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        inputs.insert(key.to_string(), value);
    }
    Ok(Value::Object(inputs))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_inputs() {
        let args: Vec<String> = ["prompt=a cat", "steps=20", "flags={\"hd\":true}", "empty="]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let inputs = parse_inputs(&args).unwrap();
        assert_eq!(
            inputs,
            json!({"prompt": "a cat", "steps": 20, "flags": {"hd": true}, "empty": ""})
        );
    }

    #[test]
    fn test_parse_inputs_rejects_bare_word() {
        assert!(parse_inputs(&["prompt".to_string()]).is_err());
    }

    #[test]
    fn test_prediction_ref() {
        let args = vec!["owner/model:v1".to_string(), "p-1".to_string()];
        let prediction = prediction_ref(&args).unwrap();
        assert_eq!(prediction.id, "p-1");
        assert_eq!(prediction.model_path, "owner/model");
        assert!(prediction_ref(&args[..1]).is_err());
    }
}
