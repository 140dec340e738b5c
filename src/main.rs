#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    gsheets_mcp::run().await
}
