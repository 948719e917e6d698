//! Example: Extract and print PNG metadata
//!
//! Prints the chunk layout, then every metadata key in sorted order.
//! An optional second argument restricts EXIF decoding to the listed sections.
//!
//! Run: `cargo run --example png_metadata -- <file.png> [IFD0,EXIF,GPS]`

use png_meta_io::{
    walk, ExifTags, ExifValue, ExtractOptions, KnownChunk, MetadataValue, PngMetadataReader,
    RenderingIntent,
};
use std::{env, fs::File, io::BufReader};

fn print_tags(tags: &ExifTags, indent: usize) {
    let pad = " ".repeat(indent);
    for (name, value) in tags {
        match value {
            ExifValue::Section(inner) => {
                println!("{pad}[{name}]");
                print_tags(inner, indent + 2);
            }
            ExifValue::Text(text) => println!("{pad}{name}: {text}"),
            other => println!("{pad}{name}: {other:?}"),
        }
    }
}

fn main() -> png_meta_io::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <png_file> [section_filter]", args[0]);
        std::process::exit(1);
    }

    let filename = &args[1];
    let mut options = ExtractOptions::new();
    if let Some(filter) = args.get(2) {
        options = options.section_filter(filter.as_str());
    }

    println!("Parsing: {}", filename);

    // Chunk layout, including chunks that carry no metadata
    let structure = walk(BufReader::new(File::open(filename)?))?;
    println!("\nChunks:");
    for (i, chunk) in structure.chunks.iter().enumerate() {
        println!(
            "  [{}] {} at offset {} ({} bytes){}",
            i,
            String::from_utf8_lossy(&chunk.tag),
            chunk.range.offset,
            chunk.range.size,
            if chunk.extracted { " *" } else { "" }
        );
    }
    if !structure.found_iend {
        println!("  (no IEND)");
    }

    let metadata = PngMetadataReader::new()
        .with_options(options)
        .read_path(filename)?;

    println!("\nMetadata:");
    for (key, value) in &metadata {
        match value {
            MetadataValue::Header(fields) => {
                println!(
                    "  {key}: {}x{}, bit depth {}, color type {}, compression {}, filter {}",
                    fields.width_px(),
                    fields.height_px(),
                    fields.bit_depth,
                    fields.color_type,
                    fields.compression_method,
                    fields.filter_method
                );
            }
            MetadataValue::Text(entries) => {
                println!("  {key}:");
                for entry in entries {
                    println!("    {} = {}", entry.keyword, entry.text);
                }
            }
            MetadataValue::Bytes(bytes) => {
                println!("  {key}: {} bytes", bytes.len());
            }
            MetadataValue::Exif(tags) => {
                println!("  {key}:");
                print_tags(tags, 4);
            }
        }
    }

    if let Some(intent) = metadata.raw(KnownChunk::Srgb).and_then(RenderingIntent::from_srgb) {
        println!("\nsRGB rendering intent: {:?}", intent);
    }

    Ok(())
}
