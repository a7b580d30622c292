mod app;
mod audio;
mod catalog;
mod config;
mod error;
mod runtime;
mod ui;
mod waveform;

#[cfg(test)]
mod testing;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
