//! Generate-secret command - prints secrets for seeding storage by hand

use clap::Args;

use crate::infrastructure::credential::SecretGenerator;

#[derive(Debug, Args)]
pub struct GenerateSecretArgs {
    /// Number of secrets to generate
    #[arg(short, long, default_value_t = 1)]
    pub count: usize,

    /// Random bytes per secret
    #[arg(long, default_value_t = SecretGenerator::DEFAULT_SECRET_BYTES)]
    pub bytes: usize,
}

/// Print `count` secrets, one per line, each followed by its stored digest
pub fn run(args: &GenerateSecretArgs) -> anyhow::Result<()> {
    if args.bytes < SecretGenerator::MIN_SECRET_BYTES {
        anyhow::bail!(
            "Refusing to generate secrets shorter than {} random bytes",
            SecretGenerator::MIN_SECRET_BYTES
        );
    }

    let generator = SecretGenerator::new().with_secret_bytes(args.bytes);

    for _ in 0..args.count {
        let generated = generator.generate();
        println!("{}\t{}", generated.secret, generated.digest.as_str());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_secrets_refused() {
        let args = GenerateSecretArgs { count: 1, bytes: 8 };
        assert!(run(&args).is_err());
    }
}
