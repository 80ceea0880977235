fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-env-changed=GUROBI_PATH");
    #[cfg(feature = "gurobi")]
    {
        let path = std::env::var("GUROBI_PATH")?;
        println!("cargo:rustc-link-search={path}");
    }
    Ok(())
}
