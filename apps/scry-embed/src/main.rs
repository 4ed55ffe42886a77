use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = scry_embed::Args::parse();
	scry_embed::run(args).await
}
