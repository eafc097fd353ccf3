use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use brightstone::ai::gemini::GeminiClient;
use brightstone::config::Settings;
use brightstone::store::{AppStore, DATA_FILE};
use brightstone::ui::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    std::fs::create_dir_all(&settings.data_dir).with_context(|| {
        format!(
            "no se pudo crear el directorio de datos {}",
            settings.data_dir.display()
        )
    })?;

    // Logs go to a file; stdout belongs to the terminal UI.
    let log_file = std::fs::File::create(settings.data_dir.join("brightstone.log"))
        .context("no se pudo crear el archivo de log")?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .init();

    let client = GeminiClient::new(settings.api_key.clone(), settings.model.clone())?;
    let model_name = client.model().to_string();
    let backend: Arc<dyn brightstone::ai::FinancialModel> = Arc::new(client);

    let store = Arc::new(AppStore::load(
        settings.data_dir.join(DATA_FILE),
        backend.clone(),
    ));

    let mut app = App::new(store, backend, model_name);
    app.request_initial_data();
    app.run().await
}
