use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");

    // Only the native-video reader links FFmpeg through ffmpeg-next.
    if env::var_os("CARGO_FEATURE_NATIVE_VIDEO").is_none() {
        return;
    }

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    match env::var_os("FFMPEG_DIR").map(PathBuf::from) {
        Some(ffmpeg_dir) if !ffmpeg_dir.join("include").is_dir() => {
            println!(
                "cargo:warning=native-video: FFMPEG_DIR={} has no include directory; ffmpeg-next needs the FFmpeg headers and libraries there.",
                ffmpeg_dir.display(),
            );
        }
        Some(_) => {}
        None if target_os == "windows" => {
            println!(
                "cargo:warning=native-video: FFMPEG_DIR is not set. ffmpeg-next cannot find FFmpeg on Windows without it; build without native-video to decode videos through the ffmpeg executable instead."
            );
        }
        None => {}
    }
}
