//! CLI argument parsing using clap

use super::BenchConfig;
use crate::util::units::ByteUnits;
use clap::Parser;

/// osbench - write-throughput benchmark for transactional object stores
#[derive(Parser, Debug)]
#[command(name = "osbench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Total size written per thread per cycle (e.g. 4K, 100M, 2G)
    #[arg(long, default_value = "1M")]
    pub size: ByteUnits,

    /// Block size for each write (e.g. 4K, 64K)
    #[arg(long, default_value = "4K")]
    pub block_size: ByteUnits,

    /// Number of times to repeat the write cycle
    #[arg(long, default_value = "1")]
    pub repeats: u32,

    /// Number of threads to carry out this workload
    #[arg(long, default_value = "1")]
    pub threads: usize,

    /// Have each thread write to a separate object
    #[arg(long)]
    pub multi_object: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn into_config(self) -> BenchConfig {
        BenchConfig {
            size: self.size,
            block_size: self.block_size,
            repeats: self.repeats,
            threads: self.threads,
            multi_object: self.multi_object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["osbench"]).unwrap();
        let config = cli.into_config();
        assert_eq!(config.size.get(), 1 << 20);
        assert_eq!(config.block_size.get(), 4096);
        assert_eq!(config.repeats, 1);
        assert_eq!(config.threads, 1);
        assert!(!config.multi_object);
    }

    #[test]
    fn test_all_options() {
        let cli = Cli::try_parse_from([
            "osbench",
            "--size",
            "8M",
            "--block-size",
            "64K",
            "--repeats",
            "3",
            "--threads",
            "4",
            "--multi-object",
        ])
        .unwrap();
        let config = cli.into_config();
        assert_eq!(config.size.get(), 8 << 20);
        assert_eq!(config.block_size.get(), 64 << 10);
        assert_eq!(config.repeats, 3);
        assert_eq!(config.threads, 4);
        assert!(config.multi_object);
    }

    #[test]
    fn test_malformed_size_is_rejected_with_usage() {
        let err = Cli::try_parse_from(["osbench", "--size", "12x"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["osbench", "--bogus"]).is_err());
    }
}
