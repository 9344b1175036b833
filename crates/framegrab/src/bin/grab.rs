use std::time::Instant;

use framegrab::{FrameGrabber, GrabberConfig, devices};

const BURST_FRAMES: u32 = 30;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let device = std::env::args().nth(1).unwrap_or_else(|| {
        // no argument: pick the first capture node on the system
        devices()
            .first()
            .map(|d| d.path.display().to_string())
            .unwrap_or_else(|| "/dev/video0".to_string())
    });

    let mut grabber = FrameGrabber::open(GrabberConfig::default().with_device(&device))?;
    print!("{}", grabber.info());

    grabber.start()?;

    // warm up, then time a burst
    let _ = grabber.grab()?;
    let start = Instant::now();
    let mut last = grabber.grab()?;
    for _ in 1..BURST_FRAMES {
        last = grabber.grab()?;
    }
    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "captured {} frames in {:.2}s ({:.1} fps)",
        BURST_FRAMES,
        elapsed,
        BURST_FRAMES as f64 / elapsed
    );

    grabber.stop()?;

    last.save_ppm("frame.ppm")?;
    println!("saved last frame to frame.ppm");

    Ok(())
}
