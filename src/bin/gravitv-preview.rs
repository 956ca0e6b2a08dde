#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use tao::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

#[cfg(target_os = "linux")]
use tao::platform::unix::WindowExtUnix;

use wry::WebViewBuilder;

#[cfg(target_os = "linux")]
use wry::WebViewBuilderExtUnix;

fn main() {
    let url = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: gravitv-preview <url> [title]");
        std::process::exit(2);
    });
    let title = std::env::args()
        .nth(2)
        .unwrap_or_else(|| "GraviTV".to_string());

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(title.as_str())
        .build(&event_loop)
        .expect("create window");

    #[cfg(not(target_os = "linux"))]
    let _webview = WebViewBuilder::new(&window)
        .with_url(&url)
        .build()
        .expect("build webview");

    // On Linux, using GTK build supports Wayland too.
    #[cfg(target_os = "linux")]
    let _webview = WebViewBuilder::new_gtk(window.gtk_window())
        .with_url(&url)
        .build()
        .expect("build gtk webview");

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        if let Event::WindowEvent { event, .. } = event {
            if matches!(event, WindowEvent::CloseRequested) {
                *control_flow = ControlFlow::Exit;
            }
        }
    });
}
