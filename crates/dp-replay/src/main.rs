//! `dp-replay` — render a stroke script to a PNG.
//!
//! ```text
//! dp-replay <script.json> <out.png>
//! RUST_LOG=debug dp-replay demos/wave.json wave.png
//! ```
//!
//! Runs the same brush, eraser and fade engines the browser pad uses, on a
//! software raster with a simulated clock, so a script renders identically
//! on every run.

mod script;

use script::Script;
use std::path::Path;
use std::process::ExitCode;

fn run(script_path: &Path, out_path: &Path) -> Result<(), String> {
    let json = std::fs::read_to_string(script_path)
        .map_err(|e| format!("cannot read {}: {e}", script_path.display()))?;
    let script = Script::from_json(&json)
        .map_err(|e| format!("invalid script {}: {e}", script_path.display()))?;

    let pad = script.replay().map_err(|e| e.to_string())?;
    let png = pad
        .surface()
        .context()
        .encode_png()
        .map_err(|e| e.to_string())?;
    std::fs::write(out_path, png)
        .map_err(|e| format!("cannot write {}: {e}", out_path.display()))?;

    let fade = pad.fade();
    log::info!(
        "wrote {} ({}x{} px, {} strokes, fade {} at {:.2})",
        out_path.display(),
        pad.surface().pixel_size().0,
        pad.surface().pixel_size().1,
        pad.stroke_count(),
        if fade.is_active() { fade.stage().name } else { "idle" },
        fade.published_opacity()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [script_path, out_path] = args.as_slice() else {
        eprintln!("usage: dp-replay <script.json> <out.png>");
        return ExitCode::from(2);
    };

    match run(Path::new(script_path), Path::new(out_path)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
