//! Profile management commands.
//!
//! List, show, validate, and copy analysis profiles.

use clap::{Args, Subcommand};
use timbral_config::{
    AnalysisProfile, ensure_user_profiles_dir, factory_profiles, get_factory_profile,
    list_user_profiles, system_profiles_dir, user_config_dir, user_profiles_dir,
};
use timbral_registry::FeatureRegistry;

use super::common::load_profile;

#[derive(Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    command: ProfilesCommand,
}

#[derive(Subcommand)]
enum ProfilesCommand {
    /// List available profiles (factory and user)
    List {
        /// Show only factory profiles
        #[arg(long)]
        factory: bool,

        /// Show only user profiles
        #[arg(long)]
        user: bool,
    },

    /// Print a profile as TOML
    Show {
        /// Profile name or path
        name: String,
    },

    /// Check a profile's ranges and feature names
    Validate {
        /// Profile name or path
        name: String,
    },

    /// Copy a factory profile to the user profiles directory for editing
    Copy {
        /// Factory profile name
        source: String,

        /// New profile name (defaults to the source name)
        #[arg(short, long)]
        name: Option<String>,

        /// Overwrite an existing user profile
        #[arg(long)]
        force: bool,
    },

    /// Show profile directories
    Paths,
}

pub fn run(args: ProfilesArgs) -> anyhow::Result<()> {
    match args.command {
        ProfilesCommand::List { factory, user } => list_profiles(factory, user),
        ProfilesCommand::Show { name } => show_profile(&name),
        ProfilesCommand::Validate { name } => validate(&name),
        ProfilesCommand::Copy {
            source,
            name,
            force,
        } => copy_profile(&source, name.as_deref(), force),
        ProfilesCommand::Paths => show_paths(),
    }
}

fn list_profiles(factory_only: bool, user_only: bool) -> anyhow::Result<()> {
    if !user_only {
        println!("Factory Profiles:");
        println!("=================");
        for profile in factory_profiles() {
            let desc = profile.description.as_deref().unwrap_or("");
            println!("  {:12} - {}", profile.name.to_lowercase(), desc);
        }
        println!();
    }

    if !factory_only {
        println!("User Profiles:");
        println!("==============");
        let user_profiles = list_user_profiles();
        if user_profiles.is_empty() {
            println!("  (none)");
            println!();
            println!("  Start from a factory profile with: timbral profiles copy <name>");
        } else {
            for path in user_profiles {
                let name = timbral_config::profile_name_from_path(&path)
                    .unwrap_or_else(|| "unknown".to_string());
                match AnalysisProfile::load(&path) {
                    Ok(profile) => {
                        let desc = profile.description.as_deref().unwrap_or("");
                        println!("  {:12} - {}", name, desc);
                    }
                    Err(e) => println!("  {:12} - (error loading: {e})", name),
                }
            }
        }
        println!();
    }

    Ok(())
}

fn show_profile(name: &str) -> anyhow::Result<()> {
    let profile = load_profile(Some(name))?;
    print!("{}", profile.to_toml()?);
    Ok(())
}

fn validate(name: &str) -> anyhow::Result<()> {
    let profile = load_profile(Some(name))?;
    let registry = FeatureRegistry::new();
    profile.validate(&registry)?;
    println!(
        "Profile '{}' is valid ({} feature(s)).",
        profile.name,
        profile.features.len()
    );
    Ok(())
}

fn copy_profile(source: &str, new_name: Option<&str>, force: bool) -> anyhow::Result<()> {
    let mut profile = get_factory_profile(source)
        .ok_or_else(|| anyhow::anyhow!("Factory profile '{source}' not found."))?;
    let target = new_name.unwrap_or(source);

    ensure_user_profiles_dir()?;
    let path = user_profiles_dir().join(format!("{target}.toml"));
    if path.exists() && !force {
        anyhow::bail!("Profile '{target}' already exists. Use --force to overwrite.");
    }

    profile.name = target.to_string();
    profile.save(&path)?;

    println!("Copied factory profile '{source}' to '{target}'");
    println!("Path: {}", path.display());
    Ok(())
}

fn show_paths() -> anyhow::Result<()> {
    println!("Profile Directories:");
    println!("====================");
    println!();
    println!("User profiles:   {}", user_profiles_dir().display());
    println!("System profiles: {}", system_profiles_dir().display());
    println!("Config dir:      {}", user_config_dir().display());
    Ok(())
}
