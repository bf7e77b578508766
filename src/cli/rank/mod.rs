//! Rank command - scores a candidate pool read from a JSON file

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::api::edge::{RelatedRequest, RelatedResponse};
use crate::config::AppConfig;
use crate::domain::relevance::RelevanceScorer;
use crate::infrastructure::logging;

#[derive(Args, Debug)]
pub struct RankArgs {
    /// JSON file with `current`, `candidates` and optional `keywords`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Only print the best N candidates
    #[arg(short, long)]
    pub top: Option<usize>,
}

/// Prints the ranking as JSON on stdout
pub async fn run(args: RankArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let contents = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let scorer = RelevanceScorer::new(config.relevance.to_scoring_config()?);
    let response = rank(&scorer, &contents, args.top)?;

    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

fn rank(scorer: &RelevanceScorer, contents: &str, top: Option<usize>) -> anyhow::Result<RelatedResponse> {
    let request: RelatedRequest =
        serde_json::from_str(contents).context("Input is not a valid ranking request")?;
    request.validate().map_err(|e| anyhow::anyhow!("{}", e))?;

    let mut results = scorer.rank(&request.current, &request.candidates, request.keywords.as_deref());

    if let Some(n) = top.or(request.top) {
        results.truncate(n);
    }

    Ok(RelatedResponse {
        current: request.current.id,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = r#"{
        "current": {
            "id": "yoga",
            "text": "Yoga per la respirazione profonda",
            "published_at": "2026-05-01T09:00:00Z",
            "category": "yoga"
        },
        "candidates": [
            { "id": "pilates", "text": "Corso di pilates", "published_at": "2026-04-01T09:00:00Z" },
            {
                "id": "breath",
                "text": "Respirazione e yoga",
                "published_at": "2026-03-01T09:00:00Z",
                "category": "yoga"
            }
        ]
    }"#;

    #[test]
    fn test_rank_from_json() {
        let response = rank(&RelevanceScorer::default(), INPUT, None).unwrap();

        assert_eq!(response.current, "yoga");
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].document.id, "breath");
    }

    #[test]
    fn test_top_overrides_file() {
        let response = rank(&RelevanceScorer::default(), INPUT, Some(1)).unwrap();

        assert_eq!(response.results.len(), 1);
    }

    #[test]
    fn test_invalid_input() {
        assert!(rank(&RelevanceScorer::default(), "{}", None).is_err());

        let empty_text = INPUT.replace("Corso di pilates", " ");
        assert!(rank(&RelevanceScorer::default(), &empty_text, None).is_err());
    }
}
