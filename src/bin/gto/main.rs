//! gto-cli - Tool for inspecting and converting GTO files.

use std::env;
use std::process::ExitCode;

use futures::executor::block_on;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use gto::binary::Endian;
use gto::compression::{self, GzipDecompressor};
use gto::core::{ObjectInfo, ReadHandler, Request};
use gto::model::{Element, Model, Property};
use gto::{Format, ReadMode, Reader, SimpleReader, SimpleWriter, WriterOptions};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "off",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return ExitCode::SUCCESS;
    }

    let result = match filtered_args[0] {
        "i" | "info" => match filtered_args.get(1) {
            Some(path) => cmd_info(path),
            None => return usage("gto-cli info <file>"),
        },
        "d" | "dump" => match filtered_args.get(1) {
            Some(path) => {
                let json_mode = filtered_args.iter().any(|&s| s == "--json" || s == "-j");
                cmd_dump(path, json_mode)
            }
            None => return usage("gto-cli dump <file> [--json]"),
        },
        "c" | "convert" => match (filtered_args.get(1), filtered_args.get(2)) {
            (Some(input), Some(output)) => match ConvertOptions::parse(&filtered_args[3..]) {
                Ok(options) => cmd_convert(input, output, options),
                Err(msg) => {
                    eprintln!("Error: {}", msg);
                    return usage(CONVERT_USAGE);
                }
            },
            _ => return usage(CONVERT_USAGE),
        },
        "-V" | "--version" => {
            println!(
                "gto-cli {} (built {} {})",
                env!("CARGO_PKG_VERSION"),
                env!("GTO_BUILD_DATE"),
                env!("GTO_BUILD_TIME")
            );
            Ok(())
        }
        "h" | "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Error: unknown command '{}'", other);
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

const CONVERT_USAGE: &str =
    "gto-cli convert <in> <out> [--text|--binary] [--version N] [--big-endian] [--gzip]";

fn usage(text: &str) -> ExitCode {
    eprintln!("Usage: {}", text);
    ExitCode::FAILURE
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_help() {
    println!("gto-cli - GTO file toolkit");
    println!();
    println!("USAGE:");
    println!("    gto-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info    <file>              Show header, encoding and object list");
    println!("    d, dump    <file> [--json]     Print every object, component and property");
    println!("    c, convert <in> <out> [opts]   Re-encode a file");
    println!("    h, help                        Show this help");
    println!();
    println!("CONVERT OPTIONS:");
    println!("    --text           Write the text encoding");
    println!("    --binary         Write the binary encoding (default)");
    println!("    --version N      Format version 2, 3 or 4 (default: 4)");
    println!("    --big-endian     Write big-endian binary");
    println!("    --gzip           Gzip the output");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Suppress log output");
    println!("    -V, --version    Show version");
    println!();
    println!("EXAMPLES:");
    println!("    gto-cli info scene.gto");
    println!("    gto-cli dump scene.gto --json");
    println!("    gto-cli convert scene.gto scene.txt.gto --text");
    println!();
    println!("NOTES:");
    println!("    - Gzip-compressed input is detected and inflated automatically");
    println!("    - RUST_LOG overrides the verbosity flags");
}

/// Read a file of any encoding, inflating gzip input.
fn load(path: &str, reader: &mut Reader, handler: &mut impl ReadHandler) -> gto::Result<()> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            gto::Error::FileNotFound(path.into())
        } else {
            gto::Error::Io(e)
        }
    })?;
    tracing::debug!(path, bytes = bytes.len(), "loaded file");
    block_on(reader.read_async(&bytes, &GzipDecompressor, handler))
}

fn read_model(path: &str) -> gto::Result<Model> {
    let mut handler = SimpleReader::new();
    load(path, &mut Reader::default(), &mut handler)?;
    handler.finish()
}

/// Index only: every object is skipped.
struct SkipAll;

impl ReadHandler for SkipAll {
    fn object(&mut self, _: &str, _: &str, _: u32, _: &ObjectInfo) -> Request {
        Request::Skip
    }
}

fn cmd_info(path: &str) -> gto::Result<()> {
    let mut reader = Reader::new(ReadMode::RANDOM_ACCESS);
    load(path, &mut reader, &mut SkipAll)?;

    println!("File:       {}", path);
    if let Some(file_type) = reader.file_type() {
        let mut encoding = file_type.to_string();
        if reader.is_compressed() {
            encoding.push_str(" (gzip)");
        }
        if file_type == gto::FileType::Binary {
            encoding.push_str(match reader.endian() {
                Endian::Little => ", little-endian",
                Endian::Big => ", big-endian",
            });
        }
        println!("Encoding:   {}", encoding);
    }
    if let Some(header) = reader.header() {
        println!("Version:    {}", header.version);
        println!(
            "Flags:      0x{:x}{}",
            header.flags,
            if header.is_transposed() { " (transposed)" } else { "" }
        );
    }
    println!("Strings:    {}", reader.string_table().len());
    println!("Objects:    {}", reader.objects().len());
    println!("Components: {}", reader.components().len());
    println!("Properties: {}", reader.properties().len());
    println!();

    for object in reader.objects() {
        println!(
            "  {} : {} ({})  [{} components]",
            reader.string(object.name)?,
            reader.string(object.protocol)?,
            object.protocol_version,
            object.num_components
        );
    }
    Ok(())
}

fn cmd_dump(path: &str, json_mode: bool) -> gto::Result<()> {
    let model = read_model(path)?;
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&model_json(&model)).unwrap_or_default());
        return Ok(());
    }

    println!("GTO version {}", model.version);
    for object in &model.objects {
        println!("{} : {} ({})", object.name, object.protocol, object.protocol_version);
        for component in &object.components {
            match component.interpretation.as_str() {
                "" => println!("  {}", component.name),
                interp => println!("  {} as {}", component.name, interp),
            }
            for property in &component.properties {
                println!(
                    "    {}[{}] {} x{}{}",
                    property.data_type(),
                    property.layout.element_width(),
                    property.name,
                    property.size(),
                    match property.interpretation.as_str() {
                        "" => String::new(),
                        interp => format!(" as {}", interp),
                    }
                );
            }
        }
    }
    Ok(())
}

fn model_json(model: &Model) -> Value {
    let objects: Vec<Value> = model
        .objects
        .iter()
        .map(|o| {
            let components: Vec<Value> = o
                .components
                .iter()
                .map(|c| {
                    let properties: Vec<Value> = c.properties.iter().map(property_json).collect();
                    json!({
                        "name": c.name,
                        "interpretation": c.interpretation,
                        "flags": c.flags,
                        "properties": properties,
                    })
                })
                .collect();
            json!({
                "name": o.name,
                "protocol": o.protocol,
                "protocolVersion": o.protocol_version,
                "components": components,
            })
        })
        .collect();
    json!({ "version": model.version, "flags": model.flags, "objects": objects })
}

fn property_json(p: &Property) -> Value {
    let values: Vec<Value> = if p.layout.element_width() == 1 {
        p.elements().flat_map(element_json).collect()
    } else {
        p.elements().map(|e| Value::Array(element_json(e))).collect()
    };
    json!({
        "name": p.name,
        "interpretation": p.interpretation,
        "type": p.data_type().name(),
        "width": p.layout.width,
        "dims": p.layout.used_dims(),
        "size": p.size(),
        "data": values,
    })
}

fn element_json(e: Element<'_>) -> Vec<Value> {
    match e {
        Element::Int(v) => v.iter().map(|&x| json!(x)).collect(),
        Element::Float(v) | Element::Half(v) => v.iter().map(|&x| json!(x)).collect(),
        Element::Double(v) => v.iter().map(|&x| json!(x)).collect(),
        Element::String(v) => v.iter().map(|x| json!(x)).collect(),
        Element::Boolean(v) => v.iter().map(|&x| json!(x)).collect(),
        Element::Short(v) => v.iter().map(|&x| json!(x)).collect(),
        Element::Byte(v) => v.iter().map(|&x| json!(x)).collect(),
        Element::Int64(v) => v.iter().map(|&x| json!(x)).collect(),
    }
}

#[derive(Debug, Default)]
struct ConvertOptions {
    format: Format,
    writer: WriterOptions,
    gzip: bool,
}

impl ConvertOptions {
    fn parse(args: &[&str]) -> Result<Self, String> {
        let mut options = Self::default();
        let mut it = args.iter();
        while let Some(&arg) = it.next() {
            match arg {
                "--text" => options.format = Format::Text,
                "--binary" => options.format = Format::Binary,
                "--big-endian" => options.writer.byte_order = Endian::Big,
                "--gzip" => options.gzip = true,
                "--version" => {
                    let value = it.next().ok_or("--version needs a value")?;
                    options.writer.version = value
                        .parse()
                        .map_err(|_| format!("invalid version '{}'", value))?;
                }
                other => return Err(format!("unknown option '{}'", other)),
            }
        }
        Ok(options)
    }
}

fn cmd_convert(input: &str, output: &str, options: ConvertOptions) -> gto::Result<()> {
    let model = read_model(input)?;
    let mut bytes = SimpleWriter::new(options.writer).write(&model, options.format)?;
    if options.gzip {
        bytes = compression::compress(&bytes, 6)?;
    }
    std::fs::write(output, &bytes)?;
    tracing::info!(
        input,
        output,
        format = ?options.format,
        version = options.writer.version,
        bytes = bytes.len(),
        "converted"
    );
    Ok(())
}
