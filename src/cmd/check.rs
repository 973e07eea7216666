use anyhow::Result;

use storyreel::config::{self, AppConfig, SpeechBackend};
use storyreel::media::{tool_available, Compositor};

fn status(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}

pub async fn cmd_check(config: &AppConfig) -> Result<()> {
    println!("🔧 storyreel {}", storyreel::VERSION);
    println!("   Config: {}", config::config_path().display());

    let ffmpeg_config = config.ffmpeg_config();
    let ffmpeg = Compositor::with_config(ffmpeg_config.clone()).check_available().await;
    let ffprobe = tool_available(&ffmpeg_config.ffprobe_path).await;
    println!(
        "\n{} ffmpeg: {} ({})",
        status(ffmpeg),
        ffmpeg_config.ffmpeg_path,
        ffmpeg_config.video_codec
    );
    println!("{} ffprobe: {}", status(ffprobe), ffmpeg_config.ffprobe_path);

    let browser = config.browser_path();
    match browser {
        Some(ref path) => println!("{} browser: {}", status(true), path.display()),
        None => println!("{} browser: not found (set [cards].browser_path)", status(false)),
    }

    let pexels = config.pexels_key().is_some();
    println!("{} footage: Pexels key {}", status(pexels), if pexels { "set" } else { "missing" });

    let speech = match config.speech.backend {
        SpeechBackend::Google => {
            let ok = config.google_key().is_some();
            println!("{} speech: Google TTS key {}", status(ok), if ok { "set" } else { "missing" });
            ok
        }
        SpeechBackend::Command => {
            let ok = which::which(&config.speech.program).is_ok();
            println!("{} speech: {}", status(ok), config.speech.program);
            ok
        }
    };

    if ffmpeg && ffprobe && browser.is_some() && pexels && speech {
        println!("\nReady to render.");
    } else {
        println!("\nSome dependencies are missing; `render` will fail until they are fixed.");
    }

    Ok(())
}
