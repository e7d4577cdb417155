//! Feature listing and information command.

use clap::Args;
use timbral_registry::{Extractor, FeatureCategory, FeatureInput, FeatureRegistry};

#[derive(Args)]
pub struct FeaturesArgs {
    /// Show details for a specific feature
    #[arg(value_name = "FEATURE")]
    feature: Option<String>,

    /// Only list one category (spectral, harmonic, pitch, temporal, cepstral)
    #[arg(long)]
    category: Option<String>,
}

pub fn run(args: FeaturesArgs) -> anyhow::Result<()> {
    let registry = FeatureRegistry::new();

    if let Some(name) = &args.feature {
        let id = registry.resolve(name)?;
        let Some(descriptor) = registry.get(id) else {
            anyhow::bail!("Unknown feature: {name}");
        };

        println!("{}", descriptor.name);
        println!("{}", "=".repeat(descriptor.name.len()));
        println!();
        println!("{}", descriptor.description);
        println!("Category: {}", descriptor.category.name());
        println!();

        println!("Inputs:");
        for input in descriptor.inputs {
            let note = match input {
                FeatureInput::Frame => "raw frame samples",
                FeatureInput::Feature(_) => "computed feature",
                FeatureInput::Filterbank => "needs --filterbank",
                FeatureInput::BarkLimits => "derived from frame size and sample rate",
                FeatureInput::PitchFilterbank => "needs --pitch-filterbank",
                FeatureInput::PitchClasses => "derived from frame size and sample rate",
            };
            println!("  {:20} {}", input.name(), note);
        }

        let plan: Vec<&str> = Extractor::new(&registry, &[id])?
            .plan()
            .map(|id| id.name())
            .collect();
        println!();
        println!("Execution order: {}", plan.join(" -> "));
        return Ok(());
    }

    let categories: Vec<FeatureCategory> = match &args.category {
        Some(name) => {
            let category = FeatureCategory::ALL
                .into_iter()
                .find(|c| c.name().eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow::anyhow!("Unknown category: {name}"))?;
            vec![category]
        }
        None => FeatureCategory::ALL.to_vec(),
    };

    println!("Available Features");
    println!("==================");

    for category in categories {
        println!();
        println!("{} - {}", category.name(), category.description());
        for descriptor in registry.features_in_category(category) {
            println!("  {:20} {}", descriptor.name, descriptor.description);
        }
    }

    println!();
    println!("Use 'timbral features <name>' for inputs and execution order.");
    Ok(())
}
