//! One-shot ingredient resolution from the command line.
//!
//! ```text
//! resolve "2% greek yogurt" --size 1 --unit cup --calories 150
//! ```
//!
//! Uses `FDC_API_KEY` for the food database and `NUTRIMATCH_ORACLE` /
//! `ANTHROPIC_API_KEY` for the disambiguation oracle. Without either, it
//! falls back to the demo API key and the rule-based oracle.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use nutrimatch_core::{
    create_oracle_from_env, FdcClient, IngredientMatcher, IngredientQuery, MatchResult,
    MemoryNutritionCache, ReferenceCache, UnitConverter,
};

#[derive(Parser)]
#[command(name = "resolve")]
#[command(about = "Resolve an ingredient name to nutrition data", long_about = None)]
struct Cli {
    /// Ingredient name as a caller would write it
    name: String,

    /// Serving amount
    #[arg(long)]
    size: Option<f64>,

    /// Serving unit ("cup", "oz", "large", ...)
    #[arg(long)]
    unit: Option<String>,

    /// Prior calorie estimate for sanity-checking the match
    #[arg(long)]
    calories: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let client = Arc::new(FdcClient::from_env()?);
    let oracle = create_oracle_from_env()?;
    let converter = UnitConverter::new(Arc::new(ReferenceCache::without_store()));

    let matcher = IngredientMatcher::new(client, oracle, converter)
        .with_nutrition_cache(Arc::new(MemoryNutritionCache::new()));

    let mut query = IngredientQuery::new(&cli.name);
    if let (Some(size), Some(unit)) = (cli.size, cli.unit.clone()) {
        query = query.with_serving(size, unit);
    }
    query.estimated_calories = cli.calories;

    match matcher.find_best_match(&query).await {
        MatchResult::Matched {
            fdc_id,
            description,
            confidence,
            reasoning,
            macros,
            needs_review,
            ..
        } => {
            println!("Matched: {description} (fdc {fdc_id}, confidence {confidence:.2})");
            println!(
                "Per 100g: {:.0} kcal, {:.1}g protein, {:.1}g carbs, {:.1}g fat",
                macros.calories, macros.protein, macros.carbs, macros.fat
            );
            if needs_review {
                println!("Needs review: calorie estimate disagrees with the match");
            }
            println!("Reasoning: {reasoning}");
        }
        MatchResult::NoMatch {
            reason,
            best_candidate,
        } => {
            println!("No match: {reason}");
            if let Some(candidate) = best_candidate {
                println!("Closest candidate: {} (fdc {})", candidate.description, candidate.fdc_id);
            }
        }
        MatchResult::Error { message } => {
            anyhow::bail!("resolution failed: {message}");
        }
    }

    Ok(())
}
