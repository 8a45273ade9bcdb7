fn main() {
    // The `ddpm` binary runs on the first available backend: wgpu, torch, then ndarray.
    let any_backend_selected = ["NDARRAY", "TORCH", "WGPU"]
        .iter()
        .any(|feature| std::env::var_os(format!("CARGO_FEATURE_{feature}")).is_some());

    if !any_backend_selected {
        println!("cargo:warning=no backend feature enabled (ndarray, torch, wgpu)");
        println!("cargo:warning=the ddpm binary needs `--features ndarray` (or torch, wgpu)");
    }
}
