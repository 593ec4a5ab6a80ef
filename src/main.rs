// What you SEE:
// • Your mirrored webcam, dimmed, with the current painting rebuilt out of dots.
// • Show a hand (or hold the left mouse button): the dots swirl into a galaxy around it.
// • Take the hand away: the next painting assembles. ESC quits.
// • If something fatal happens: "Something went wrong." R reloads, ESC quits.

mod camera;
mod composite;
mod config;
mod draw;
mod error;
mod interp;
mod particles;
mod render;
mod sampler;
mod session;
mod tracking;
mod types;
mod view;

use camera::CameraBackdrop;
use clap::Parser;
use composite::{composite_premultiplied, darken_in_place, fill_cover_mirrored};
use config::{
    Args, BACKDROP_DARKEN, CAMERA_HEIGHT, CAMERA_WIDTH, PARTICLE_COUNT, SAMPLE_SIZE, WINDOW_TITLE,
};
use draw::{Drawer, Hud, draw_crosshair, draw_fatal, draw_hud, draw_loading};
use error::Error;
use render::{FrameUniforms, ParticleRenderer};
use sampler::{LoadProgress, load_catalog};
use session::{HandPosture, Session};
use std::time::{Duration, Instant};
use tracking::{
    HandTracker, LandmarkSource, LandmarkStreamTracker, PointerTracker, TrackerPoller, TrackingSink,
};
use types::FrameBuffer;
use view::ViewCamera;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    /* --- Window ---
       Visual: a black window opens; everything else draws into it. */
    let mut drawer = Drawer::new(WINDOW_TITLE, args.width, args.height)?;

    /* --- Error boundary ---
       Visual: a fatal error swaps the experience for the reload screen. */
    while drawer.is_open() {
        match run_session(&args, &mut drawer) {
            Ok(()) => break, // window closed or ESC
            Err(e) => {
                log::error!("{e}");
                if !show_fatal(&mut drawer, &e)? {
                    break;
                }
                log::info!("Reloading session");
            }
        }
    }

    Ok(())
}

/// Hold the error screen until the user reloads (true) or quits (false).
fn show_fatal(drawer: &mut Drawer, error: &Error) -> Result<bool, Error> {
    let (w, h) = drawer.size();
    let mut screen = FrameBuffer::new(w, h);
    let message = error.to_string();
    while drawer.is_open() {
        if drawer.esc_pressed() {
            return Ok(false);
        }
        if drawer.r_pressed_once() {
            return Ok(true);
        }
        let (w, h) = drawer.size();
        screen.resize(w, h);
        draw_fatal(&mut screen, &message);
        drawer.present(&screen)?;
    }
    Ok(false)
}

/// One full run: load the paintings, then animate until the window closes.
fn run_session(args: &Args, drawer: &mut Drawer) -> Result<(), Error> {
    let (w, h) = drawer.size();
    let mut screen = FrameBuffer::new(w, h);

    /* --- Catalog ---
       Visual: "Loading Art... (k/n)" counts up while paintings decode. */
    let artworks = args.artworks();
    draw_loading(&mut screen, LoadProgress { loaded: 0, attempted: 0, total: artworks.len() });
    drawer.present(&screen)?;

    let mut window_error = None;
    let images = load_catalog(&artworks, SAMPLE_SIZE, |progress| {
        let (w, h) = drawer.size();
        screen.resize(w, h);
        draw_loading(&mut screen, progress);
        if let Err(e) = drawer.present(&screen) {
            if window_error.is_none() {
                window_error = Some(e);
            }
        }
    })?;
    if let Some(e) = window_error {
        return Err(e);
    }

    /* --- Session + GPU ---
       Visual: the first painting is ready as soon as the loop starts. */
    let mut session = Session::new(images, PARTICLE_COUNT, args.seed);
    let (w, h) = drawer.size();
    let mut view = ViewCamera::new(w as u32, h as u32);
    let mut renderer = ParticleRenderer::new(w as u32, h as u32, PARTICLE_COUNT)?;
    renderer.upload(session.particles());
    let mut uploaded_version = session.particles_version();

    /* --- Camera backdrop ---
       Visual: black until the first webcam frame arrives (or forever with --no-camera). */
    let backdrop = if args.no_camera {
        CameraBackdrop::disabled()
    } else {
        CameraBackdrop::spawn(args.camera, CAMERA_WIDTH, CAMERA_HEIGHT)
    };
    let mut camera_frame = FrameBuffer::new(0, 0);

    /* --- Hand tracking ---
       Visual: nothing until a tracker is ready; then hands start the galaxy. */
    let sink = TrackingSink::new();
    let pointer = PointerTracker::default();
    let tracker: Box<dyn HandTracker> = match &args.landmarks {
        Some(path) => Box::new(LandmarkStreamTracker::new(LandmarkSource::from_arg(path.clone()))),
        None => Box::new(pointer.clone()),
    };
    let use_pointer = args.landmarks.is_none();
    let tracker_label = tracker.label();
    let mut poller = TrackerPoller::new(tracker, sink.clone(), args.poll_interval());

    /* --- HUD / FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut fps = 0.0_f32;
    let mut last_phase = session.phase();

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        /* 1) Follow window resizes: projection, offscreen target, screen buffer. */
        let (w, h) = drawer.size();
        if (w, h) != (screen.width, screen.height) {
            log::debug!("Window resized to {w}x{h}");
            screen.resize(w, h);
            view.set_viewport(w as u32, h as u32);
            renderer.resize(w as u32, h as u32);
        }

        /* 2) Tracking: start the tracker once ready, then apply every hand loss
              since the last frame plus the newest sample. */
        let tracking_live = poller.tick(now);
        if use_pointer {
            pointer.feed(drawer.mouse_pos(), drawer.left_mouse_down(), (w, h));
        }
        session.on_tracking(sink.drain(), view.aspect);

        /* 3) Frame update: ease mix + hand, tick the clock, re-upload after a rebuild. */
        session.on_frame();
        if session.phase() != last_phase {
            log::debug!("Display phase: {:?}", session.phase());
            last_phase = session.phase();
        }
        if session.particles_version() != uploaded_version {
            renderer.upload(session.particles());
            uploaded_version = session.particles_version();
        }

        /* 4) Particles on the GPU, read back as an RGBA layer. */
        let frame = FrameUniforms {
            time: session.interp.time,
            mix_factor: session.interp.current_mix,
            hand_position: session.interp.smoothed_hand,
            hand_active: session.interp.hand_active,
        };
        let layer = renderer.render(&view, &frame)?;

        /* 5) Backdrop: newest webcam frame, mirrored + cover-fit, 60% darker; particles over it. */
        if let Some(latest) = backdrop.latest() {
            camera_frame = latest;
        }
        fill_cover_mirrored(&camera_frame, &mut screen);
        darken_in_place(&mut screen, BACKDROP_DARKEN);
        composite_premultiplied(&mut screen, layer)?;

        /* 6) HUD (+ crosshair while the mouse is the hand). */
        if use_pointer && drawer.left_mouse_down() {
            if let Some((mx, my)) = drawer.mouse_pos() {
                draw_crosshair(&mut screen, mx as i32, my as i32, 12, 0x00_FF_CC_33);
            }
        }
        let posture = match session.posture() {
            HandPosture::Open => "open hand",
            HandPosture::Unknown => "no hand",
        };
        let tracking = if tracking_live {
            format!("{tracker_label} | {posture}")
        } else {
            format!("waiting for {tracker_label}")
        };
        draw_hud(
            &mut screen,
            &Hud {
                painting: session.current_name(),
                index: session.current_index(),
                total: session.image_count(),
                galaxy_active: session.interp.hand_active,
                tracking: &tracking,
                fps,
            },
        );

        /* 7) Present to the window (this is when the on-screen image updates). */
        drawer.present(&screen)?;

        /* 8) FPS counter (log + HUD once per second) */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            fps = frames_this_second as f32 / secs;
            log::info!("FPS: {fps:.1} (camera {})", if backdrop.is_live() { "live" } else { "off" });
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    log::info!("Session ended after {} painting switches", session.switches());
    Ok(())
}
