use podvend_diagnostics::Result;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() -> Result<()> {
    podvend_cli::run_cli().await
}
