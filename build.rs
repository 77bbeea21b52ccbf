use std::env;
use std::path::PathBuf;

const DEFAULT_F_CPU: &str = "16000000";

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // CPU frequency for timing calculations, overridable per board
    println!("cargo:rerun-if-env-changed=F_CPU");
    let f_cpu = env::var("F_CPU").unwrap_or_else(|_| DEFAULT_F_CPU.to_string());
    match f_cpu.parse::<u32>() {
        Ok(hz) if hz > 0 => {}
        _ => panic!("F_CPU must be a positive integer frequency in Hz, got {:?}", f_cpu),
    }
    println!("cargo:rustc-env=MCU_FREQ_HZ={}", f_cpu);

    let target = env::var("TARGET").unwrap();
    if target.contains("avr") {
        println!("cargo:rustc-link-arg=-mmcu=atmega328p");
        println!("cargo:warning=Building for ATmega328P at {}Hz", f_cpu);
        println!("cargo:warning=Output directory: {}", out_dir.display());
    }
}
