use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};
use clap_num::maybe_hex;
use colored::Colorize;
use qca_edl::{MAX_SIZE_PER_TLV_SEGMENT, SegmentPlan, commands::segment::MAX_SEGMENT_LIMIT};
use qca_tlv::{
    BaudRate, NvmTag, Record, RecordType, Result, TagWalker, TlvHeader, body, check_data,
    err::Error, patch::PatchRecord,
};

mod logging;

#[derive(Subcommand)]
enum Action {
    /// Dump the TLV header and the record contents
    Info,
    /// Patch an NVM image for the given UART speed
    Patch {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// UART speed in bits per second
        #[arg(long, default_value_t = 115_200)]
        baud_rate: u32,
    },
    /// Show how the image would be split for download
    Segments {
        #[arg(long, default_value_t = MAX_SIZE_PER_TLV_SEGMENT, value_parser=maybe_hex::<u8>)]
        max_segment: u8,
    },
}

#[derive(Parser)]
struct Cli {
    /// Input file
    #[arg(short, long)]
    input: PathBuf,

    /// Log more, repeat for even more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    action: Action,
}

fn info(image: &[u8]) -> Result<()> {
    let header = TlvHeader::parse(image)?;
    println!("{header}");

    let body = body(image, &header)?;
    match header.ty() {
        RecordType::Patch => match PatchRecord::parse(body) {
            Ok(patch) => println!("{patch}"),
            Err(e) => println!("{}", format!("No rampatch metadata: {e}").yellow()),
        },
        RecordType::Nvm => {
            for tag in TagWalker::new(body) {
                let tag = tag?;
                println!(
                    "Tag {:>5} at {:#06x}: {} bytes",
                    tag.id(),
                    tag.offset(),
                    tag.len()
                );
            }
        }
        RecordType::Unknown(_) => println!("{}", "Nothing to decode".yellow()),
    }

    Ok(())
}

/// Apply the NVM patches for `speed` to a whole NVM image
fn patch_image(image: &mut [u8], speed: u32) -> Result<Vec<NvmTag>> {
    let baud_rate =
        BaudRate::from_speed(speed).ok_or(Error::Custom("Unsupported baud rate".into()))?;
    if !TlvHeader::parse(image)?.ty().is_nvm() {
        return Err(Error::Custom("Not an NVM image".into()));
    }

    progress!("Patching NVM for {baud_rate} baud... ");
    match status!(check_data(image, baud_rate.code()))? {
        (_, Record::Nvm(tags)) => Ok(tags),
        _ => Ok(vec![]),
    }
}

/// How the record at the start of `image` would be cut for download
fn segment_plan(image: &[u8], max_segment: u8) -> Result<(TlvHeader, SegmentPlan)> {
    if max_segment == 0 || max_segment > MAX_SEGMENT_LIMIT {
        return Err(Error::Custom("Segment size out of range".into()));
    }

    let header = TlvHeader::parse(image)?;
    let size = header.total_size().min(image.len());
    Ok((header, SegmentPlan::new(size, max_segment as usize)))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose).map_err(|e| Error::Custom(e.to_string().into()))?;

    let mut image = fs::read(&cli.input)?;

    match cli.action {
        Action::Info => info(&image)?,

        Action::Patch { output, baud_rate } => {
            let tags = patch_image(&mut image, baud_rate)?;
            println!("{} tags walked", tags.len());
            fs::write(output, &image)?;
        }

        Action::Segments { max_segment } => {
            let (header, plan) = segment_plan(&image, max_segment)?;
            println!("{header}");
            println!(
                "{} segments of {max_segment} bytes, {} trailing bytes, {} commands",
                plan.full(),
                plan.remainder(),
                plan.count()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use qca_tlv::nvm::EDL_TAG_ID_HCI;

    use super::*;

    fn nvm_image(ty: RecordType) -> Vec<u8> {
        let mut body = EDL_TAG_ID_HCI.to_le_bytes().to_vec();
        body.extend_from_slice(&3u16.to_le_bytes());
        body.extend_from_slice(&[0; 8]);
        body.extend_from_slice(&[0x01, 0x02, 0x03]);

        let mut image = TlvHeader::new(ty, body.len() as u32).encode().to_vec();
        image.extend(body);
        image
    }

    #[test]
    fn patch_writes_baud_code() {
        let mut image = nvm_image(RecordType::Nvm);
        let tags = patch_image(&mut image, 3_000_000).unwrap();

        assert_eq!(tags.len(), 1);
        assert_eq!(&image[16..], &[0x81, 0x02, 0x0e]);
    }

    #[test]
    fn patch_refuses_bad_arguments() {
        let mut image = nvm_image(RecordType::Nvm);
        let before = image.clone();
        assert!(matches!(patch_image(&mut image, 1234), Err(Error::Custom(_))));
        assert_eq!(image, before);

        let mut image = nvm_image(RecordType::Patch);
        let before = image.clone();
        assert!(matches!(patch_image(&mut image, 115_200), Err(Error::Custom(_))));
        assert_eq!(image, before);
    }

    #[test]
    fn segments_cover_header_and_body() {
        let image = nvm_image(RecordType::Nvm);
        let (header, plan) = segment_plan(&image, 7).unwrap();

        assert_eq!(header.total_size(), 19);
        assert_eq!((plan.full(), plan.remainder(), plan.count()), (2, 5, 3));
    }

    #[test]
    fn segment_size_out_of_range() {
        let image = nvm_image(RecordType::Nvm);
        assert!(segment_plan(&image, 0).is_err());
        assert!(segment_plan(&image, MAX_SEGMENT_LIMIT + 1).is_err());
        assert!(segment_plan(&image, MAX_SEGMENT_LIMIT).is_ok());
    }
}
