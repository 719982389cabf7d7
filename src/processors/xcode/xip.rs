//! Xcode `.xip` unpacking: xar container, pbzx payload stream, xz/cpio
//! archive.

use crate::core::Processor;
use crate::core::descriptor::{ProcessorDescriptor, optional, output, required};
use crate::core::env::{Env, de};
use crate::error::{ProcessorError, Result};
use crate::exec::{CommandSpec, StderrPolicy, run_checked};
use crate::traits::AppContext;
use crate::ui;
use crate::utils::paths;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const PBZX_MAGIC: &[u8; 4] = b"pbzx";
const XZ_MAGIC: &[u8; 6] = b"\xfd7zXZ\x00";
const PBZX_MORE_CHUNKS: u64 = 1 << 24;

/// Decode a pbzx stream into the concatenated xz chunks it carries.
/// Returns the number of payload bytes written.
pub fn decode_pbzx<R: Read, W: Write>(mut reader: R, mut writer: W) -> Result<u64> {
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|_| ProcessorError::Format("Not a pbzx file".to_string()))?;
    if &magic != PBZX_MAGIC {
        return Err(ProcessorError::Format("Not a pbzx file".to_string()));
    }

    let mut flags = read_u64(&mut reader)?
        .ok_or_else(|| ProcessorError::Format("pbzx header is truncated".to_string()))?;
    let mut written = 0u64;

    while flags & PBZX_MORE_CHUNKS != 0 {
        let Some(next_flags) = read_u64(&mut reader)? else {
            break;
        };
        flags = next_flags;
        let length = read_u64(&mut reader)?
            .ok_or_else(|| ProcessorError::Format("pbzx chunk length is truncated".to_string()))?;

        let mut chunk_magic = [0u8; 6];
        if length < chunk_magic.len() as u64 || reader.read_exact(&mut chunk_magic).is_err() {
            return Err(ProcessorError::Format("pbzx chunk is truncated".to_string()));
        }
        if &chunk_magic != XZ_MAGIC {
            return Err(ProcessorError::Format("Chunk header is not an xz header".to_string()));
        }
        writer.write_all(&chunk_magic)?;

        let rest = length - chunk_magic.len() as u64;
        let copied = io::copy(&mut reader.by_ref().take(rest), &mut writer)?;
        if copied != rest {
            return Err(ProcessorError::Format("pbzx chunk is truncated".to_string()));
        }
        written += length;
    }

    writer.flush()?;
    Ok(written)
}

/// Big-endian u64, or `None` at a clean or partial end of stream.
fn read_u64<R: Read>(reader: &mut R) -> Result<Option<u64>> {
    let mut buf = [0u8; 8];
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => return Ok(None),
            n => filled += n,
        }
    }
    Ok(Some(u64::from_be_bytes(buf)))
}

// ---------------------------------------------------------------------------

pub struct XcodeXIPUnpacker;

static XCODE_XIP_UNPACKER: ProcessorDescriptor = ProcessorDescriptor {
    name: "XcodeXIPUnpacker",
    description: "Unpacks an Apple XIP file.",
    inputs: &[
        required("PKG", "Path to an Xcode .xip file."),
        optional(
            "output_path",
            "Path to unpack the contents. Defaults to RECIPE_CACHE_DIR/NAME_unpack.",
        ),
        optional("RECIPE_CACHE_DIR", "Recipe cache directory."),
        optional("NAME", "Recipe name."),
        optional(
            "nocleanup",
            "Don't clean up temporary archives after extraction. Defaults to false.",
        ),
    ],
    outputs: &[output("output_app", "Path to the extracted Xcode.app.")],
};

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct XipInput {
    PKG: PathBuf,
    #[serde(default, deserialize_with = "de::opt_text")]
    output_path: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    RECIPE_CACHE_DIR: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    NAME: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    nocleanup: bool,
}

#[derive(Serialize)]
struct XipOutput {
    output_app: String,
}

impl XipInput {
    fn output_dir(&self) -> Result<PathBuf> {
        if let Some(path) = &self.output_path {
            return Ok(PathBuf::from(path));
        }
        match (&self.RECIPE_CACHE_DIR, &self.NAME) {
            (Some(cache), Some(name)) => Ok(Path::new(cache).join(format!("{}_unpack", name))),
            _ => Err(ProcessorError::invalid(
                "output_path",
                "required when RECIPE_CACHE_DIR and NAME are not both set",
            )),
        }
    }
}

fn pbzx_to_xz(content: &Path, xz_path: &Path) -> Result<()> {
    ui::info(&format!("PBZX unpacking {}", content.display()));
    let reader = File::open(content).map_err(|e| ProcessorError::io(content, e))?;
    let writer = File::create(xz_path).map_err(|e| ProcessorError::io(xz_path, e))?;
    decode_pbzx(BufReader::new(reader), BufWriter::new(writer))?;
    ui::info("Finished pbzx decode.");
    Ok(())
}

fn first_xcode_app(output: &Path) -> Result<PathBuf> {
    let pattern = format!("{}/Xcode*", glob::Pattern::escape(&output.to_string_lossy()));
    let mut found: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| ProcessorError::Other(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .collect();
    found.sort();
    found
        .into_iter()
        .next()
        .ok_or_else(|| ProcessorError::NotFound(format!("No Xcode* in {}", output.display())))
}

fn unpack(ctx: &AppContext, xip: &Path, output: &Path, nocleanup: bool) -> Result<PathBuf> {
    let xar_dir = output.join("xar");
    let temp_dir = output.join("temp");

    paths::ensure_dir(&xar_dir)?;
    ui::info(&format!("Xar unpacking {}", xip.display()));
    let xar = CommandSpec::new(ctx.tool("xar"))
        .arg("-xf")
        .path_arg(xip)
        .arg("-C")
        .path_arg(&xar_dir);
    run_checked(ctx, &xar, StderrPolicy::Fatal)?;

    paths::ensure_dir(&temp_dir)?;
    let xz_path = temp_dir.join("Content.xz");
    pbzx_to_xz(&xar_dir.join("Content"), &xz_path)?;

    ui::info(&format!("Gunzip unpacking {}", xz_path.display()));
    let gunzip = CommandSpec::new(ctx.tool("gunzip"))
        .arg("-f")
        .path_arg(&xz_path)
        .current_dir(&temp_dir);
    run_checked(ctx, &gunzip, StderrPolicy::Fatal)?;

    let cpio = temp_dir.join("Content");
    ui::info(&format!("Ditto extraction of CPIO archive {}", cpio.display()));
    let ditto = CommandSpec::new(ctx.tool("ditto"))
        .arg("-x")
        .path_arg(&cpio)
        .path_arg(output);
    run_checked(ctx, &ditto, StderrPolicy::Fatal)?;

    if nocleanup {
        ui::verbose("nocleanup set, keeping temporary archives");
    } else {
        ui::info("Cleaning up temporary archives.");
        remove_tree(&xar_dir)?;
        remove_tree(&temp_dir)?;
    }

    first_xcode_app(output)
}

fn remove_tree(path: &Path) -> Result<()> {
    fs::remove_dir_all(path).map_err(|e| ProcessorError::io(path, e))
}

impl Processor for XcodeXIPUnpacker {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &XCODE_XIP_UNPACKER
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: XipInput = env.decode()?;
        if !input.PKG.is_file() {
            return Err(ProcessorError::NotFound(format!(
                "XIP file {} does not exist",
                input.PKG.display()
            )));
        }

        let output = input.output_dir()?;
        let created = !output.exists();
        paths::ensure_dir(&output)?;

        match unpack(ctx, &input.PKG, &output, input.nocleanup) {
            Ok(app) => {
                ui::success(&format!("Unpacked {}", app.display()));
                Env::encode(&XipOutput {
                    output_app: app.to_string_lossy().into_owned(),
                })
            }
            Err(e) => {
                // leave nothing half-extracted behind
                if created {
                    let _ = fs::remove_dir_all(&output);
                } else {
                    let _ = fs::remove_dir_all(output.join("xar"));
                    let _ = fs::remove_dir_all(output.join("temp"));
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests;
