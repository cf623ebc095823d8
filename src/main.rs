use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use memegen::api::MemeBackend;
use memegen::editor::{LoadOutcome, MemeEditor};
use memegen::gallery::Gallery;
use memegen::http::HttpBackend;
use memegen::loader::{ImageFetcher, ImageLoader};
use memegen::upload::UploadFile;
use memegen::{Compositor, FontFamily, MemeClient, MemeConfig, Template};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "memegen", version, about = "Compose memes locally or through a meme backend")]
struct Cli {
    /// Backend API base URL (defaults to $MEMEGEN_API_URL or http://localhost:8001/api)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding font files (defaults to $MEMEGEN_FONTS_DIR or ./fonts)
    #[arg(long, global = true)]
    fonts_dir: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the backend's templates
    Templates,
    /// Render a meme locally and write it as PNG
    Render {
        /// Background image: URL, data URL or file path
        #[arg(long, conflicts_with = "template")]
        image: Option<String>,
        /// Background template id (looked up on the backend)
        #[arg(long)]
        template: Option<String>,
        #[command(flatten)]
        text: TextArgs,
        #[arg(short, long, default_value = "meme.png")]
        output: PathBuf,
    },
    /// Have the backend render a meme from a template
    Create {
        #[arg(long)]
        template: String,
        #[command(flatten)]
        text: TextArgs,
    },
    /// Upload an image file and print its URL
    Upload { file: PathBuf },
    /// List saved memes
    List,
    /// Delete a saved meme
    Delete { id: String },
}

#[derive(Args)]
struct TextArgs {
    /// Text line as `TEXT` or `TEXT@VERTICAL,HORIZONTAL` (percent); repeatable
    #[arg(long = "line", value_parser = parse_line)]
    lines: Vec<LineArg>,
    #[arg(long, default_value = "Impact", value_parser = parse_font)]
    font: FontFamily,
    /// Font size in pixels, clamped to 16..=48
    #[arg(long, default_value_t = 36)]
    size: u32,
    #[arg(long, default_value = "#ffffff")]
    color: String,
}

#[derive(Clone, Debug)]
struct LineArg {
    text: String,
    position: Option<(u32, u32)>,
}

fn parse_line(s: &str) -> Result<LineArg, String> {
    if let Some((text, pos)) = s.rsplit_once('@') {
        if let Some((v, h)) = pos.split_once(',') {
            if let (Ok(v), Ok(h)) = (v.trim().parse(), h.trim().parse()) {
                return Ok(LineArg {
                    text: text.to_string(),
                    position: Some((v, h)),
                });
            }
        }
    }
    Ok(LineArg {
        text: s.to_string(),
        position: None,
    })
}

fn parse_font(s: &str) -> Result<FontFamily, String> {
    s.parse().map_err(|e: memegen::Error| e.to_string())
}

/// Fill the editor's lines: the first two reuse the default top/bottom lines,
/// the rest are appended.
fn apply_text(editor: &mut MemeEditor, text: &TextArgs) -> anyhow::Result<()> {
    for (i, arg) in text.lines.iter().enumerate() {
        let id = match editor.text_lines().get(i) {
            Some(line) => line.id,
            None => editor.add_text_line(),
        };
        editor.update_text(id, arg.text.clone());
        if let Some((v, h)) = arg.position {
            editor.set_vertical_position(id, v);
            editor.set_horizontal_position(id, h);
        }
    }
    editor.set_font_family(text.font);
    editor.set_font_size(text.size);
    editor.set_text_color(&text.color)?;
    Ok(())
}

fn find_template(backend: &HttpBackend, id: &str) -> anyhow::Result<Template> {
    backend
        .list_templates()?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| anyhow!("no template with id {}", id))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = MemeConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_base = url;
    }
    if let Some(dir) = cli.fonts_dir {
        config.fonts_dir = Some(dir);
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeout_ms = ms;
    }
    config.validate()?;

    let backend = memegen::new_backend(&config)?;

    match cli.command {
        Command::Templates => {
            for t in backend.list_templates()? {
                println!("{:>12}  {}x{}  {}  {}", t.id, t.width, t.height, t.name, t.url);
            }
        }
        Command::Render {
            image,
            template,
            text,
            output,
        } => {
            let mut editor = MemeEditor::new();
            match (image, template) {
                (Some(image), _) => editor.set_custom_image(image),
                (None, Some(id)) => editor.select_template(find_template(&backend, &id)?),
                (None, None) => bail!("pass --image or --template"),
            }
            apply_text(&mut editor, &text)?;

            let (loader, mut completions) = ImageLoader::spawn(ImageFetcher::new(&config)?);
            editor.request_image_load(&loader)?;
            while editor.is_loading() {
                let completion = completions
                    .recv_blocking()
                    .ok_or_else(|| anyhow!("image loader stopped"))?;
                if let LoadOutcome::Failed(reason) = editor.apply_load(completion) {
                    bail!("could not load background: {}", reason);
                }
            }

            let compositor = Compositor::from_config(&config);
            let raster = editor
                .render_preview(&compositor)
                .ok_or_else(|| anyhow!("no background image"))?;
            raster
                .save_png(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("{}", output.display());
        }
        Command::Create { template, text } => {
            let mut editor = MemeEditor::new();
            editor.select_template(find_template(&backend, &template)?);
            apply_text(&mut editor, &text)?;
            let request = editor.create_request(config.canvas)?;

            let client = MemeClient::new(backend);
            let runtime = tokio::runtime::Runtime::new()?;
            let created = runtime.block_on(client.create_meme(request))?;
            runtime.block_on(client.close())?;
            println!("{}", created.url);
        }
        Command::Upload { file } => {
            let file = UploadFile::from_path(&file)?;
            let uploaded = backend.upload_image(&file)?;
            if let Some(id) = uploaded.id {
                log::info!("Uploaded {} as {}", file.filename, id);
            }
            println!("{}", uploaded.url);
        }
        Command::List => {
            let mut gallery = Gallery::new();
            gallery.refresh(&backend)?;
            for m in gallery.memes() {
                println!(
                    "{}  {}  {}",
                    m.id,
                    m.created_at.as_deref().unwrap_or("-"),
                    m.url
                );
            }
        }
        Command::Delete { id } => {
            let mut gallery = Gallery::new();
            gallery.delete(&backend, &id)?;
            println!("deleted {}", id);
        }
    }

    Ok(())
}
