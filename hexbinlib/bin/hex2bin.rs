use clap::Parser;
use hexbinlib::{AddressWindow, FlashImage, ParseOptions};
use std::path::PathBuf;
use std::process;

/// Extract one address window of an Intel HEX file into a raw binary (gaps filled with
/// 0xFF) and print the CRC-32 of the written bytes.
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = None,
    after_help = "Example:\n  hex2bin app.hex bank1.bin 0x08000000 0xE4F0"
)]
struct Cli {
    /// Intel HEX input file
    input: PathBuf,
    /// Raw binary output file
    output: PathBuf,
    /// Start address of the window (hex, optional 0x prefix)
    #[arg(value_parser = parse_hex_str)]
    start: u32,
    /// Window size in bytes (hex, optional 0x prefix)
    #[arg(value_parser = parse_hex_str)]
    size: u32,
    /// Skip records whose trailing checksum is missing or wrong
    #[arg(long)]
    verify_checksums: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let window = AddressWindow::new(cli.start, cli.size)?;
    let options = ParseOptions {
        verify_checksums: cli.verify_checksums,
    };

    let image = FlashImage::from_hex(&cli.input, window, options)?;

    let skipped = image.report().malformed.len();
    if skipped > 0 {
        log::warn!("Skipped {skipped} malformed line(s)");
    }

    image.write_bin(&cli.output)?;

    println!("Successfully created binary file: {}", cli.output.display());
    println!("Size: {} bytes", image.len());
    println!("Generated Hash: 0x{:08X}", image.checksum());
    Ok(())
}

// =============================== HELPER FUNCTIONS ===============================

/// Parse a string as a 32-bit hex number (with optional 0x prefix)
fn parse_hex_str(s: &str) -> Result<u32, std::num::ParseIntError> {
    let s = s.trim();

    // Handle explicit 0x prefix
    if let Some(hex_str) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u32::from_str_radix(hex_str, 16);
    }

    // Parse as hex without prefix
    u32::from_str_radix(s, 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_str() {
        assert_eq!(parse_hex_str("0x08000000"), Ok(0x0800_0000));
        assert_eq!(parse_hex_str("0XE738"), Ok(0xE738));
        assert_eq!(parse_hex_str("e4f0"), Ok(0xE4F0));
        assert_eq!(parse_hex_str(" 10 "), Ok(0x10));
        assert!(parse_hex_str("0x").is_err());
        assert!(parse_hex_str("0x1_0000_0000").is_err());
        assert!(parse_hex_str("100000000").is_err());
        assert!(parse_hex_str("xyz").is_err());
    }

    #[test]
    fn test_cli_requires_four_positionals() {
        assert!(Cli::try_parse_from(["hex2bin", "in.hex", "out.bin", "0x0"]).is_err());
        assert!(
            Cli::try_parse_from(["hex2bin", "in.hex", "out.bin", "0x0", "0x10", "extra"]).is_err()
        );

        let cli = Cli::try_parse_from(["hex2bin", "in.hex", "out.bin", "0x08000000", "0x10"]);
        assert!(cli.is_ok());
        if let Ok(cli) = cli {
            assert_eq!(cli.start, 0x0800_0000);
            assert_eq!(cli.size, 0x10);
            assert!(!cli.verify_checksums);
        }
    }
}
