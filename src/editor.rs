//! Editing state.
//!
//! [`MemeEditor`] is the one owner of everything the user edits: the image
//! source, the text lines, the shared style, the decoded background and the
//! result of the last remote render. Rendering and submission read from it
//! explicitly; nothing here is global.

use crate::api::{CreateCustomMemeRequest, CreateMemeRequest, CreatedMeme, TextBox};
use crate::loader::{ImageLoader, LoadCompletion, LoadTicket};
use crate::model::{
    clamp_font_size, clamp_position, FontFamily, ImageSource, Style, Template, TextColor, TextLine,
    TextLineId,
};
use crate::rendering::layout::{place_line, text_box};
use crate::rendering::{Compositor, Raster};
use crate::{CanvasSize, Error, Result};
use image::DynamicImage;
use std::sync::Arc;

/// What happened to a load completion handed to [`MemeEditor::apply_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image became the current background.
    Applied,
    /// A newer load was requested since; the result was dropped.
    Stale,
    /// The load failed; the previous background (if any) stays.
    Failed(String),
}

/// The downloadable form of the current meme.
#[derive(Debug, Clone, PartialEq)]
pub enum Export {
    /// URL of an image rendered by the backend.
    Remote(String),
    /// PNG bytes rendered locally.
    Local(Vec<u8>),
}

#[derive(Debug)]
pub struct MemeEditor {
    source: Option<ImageSource>,
    lines: Vec<TextLine>,
    style: Style,
    next_id: u64,
    latest_load: Option<LoadTicket>,
    image: Option<Arc<DynamicImage>>,
    remote_result: Option<CreatedMeme>,
}

impl MemeEditor {
    /// Two blank lines, near the top and bottom, in the default style.
    pub fn new() -> Self {
        Self {
            source: None,
            lines: vec![
                TextLine::at(TextLineId(1), 20, 50),
                TextLine::at(TextLineId(2), 80, 50),
            ],
            style: Style::default(),
            next_id: 3,
            latest_load: None,
            image: None,
            remote_result: None,
        }
    }

    pub fn source(&self) -> Option<&ImageSource> {
        self.source.as_ref()
    }

    pub fn selected_template(&self) -> Option<&Template> {
        self.source.as_ref().and_then(ImageSource::template)
    }

    pub fn custom_image(&self) -> Option<&str> {
        match &self.source {
            Some(ImageSource::Custom(loc)) => Some(loc),
            _ => None,
        }
    }

    pub fn text_lines(&self) -> &[TextLine] {
        &self.lines
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        self.image.as_ref()
    }

    pub fn remote_result(&self) -> Option<&CreatedMeme> {
        self.remote_result.as_ref()
    }

    // --- image source ---

    /// Use a template as background. Clears any custom image.
    pub fn select_template(&mut self, template: Template) {
        log::info!("Selected template {} ({})", template.id, template.name);
        self.replace_source(ImageSource::Template(template));
    }

    /// Use an uploaded image, pasted URL or file as background. Clears any
    /// selected template.
    pub fn set_custom_image(&mut self, location: impl Into<String>) {
        self.replace_source(ImageSource::Custom(location.into()));
    }

    fn replace_source(&mut self, source: ImageSource) {
        self.source = Some(source);
        self.image = None;
        self.remote_result = None;
        // Anything still loading belongs to the old source
        self.latest_load = None;
    }

    /// Install an already decoded background, invalidating pending loads.
    pub fn set_image(&mut self, image: Arc<DynamicImage>) {
        self.latest_load = None;
        self.image = Some(image);
        self.invalidate_result();
    }

    /// A remote render only matches the state it was requested for.
    fn invalidate_result(&mut self) {
        if self.remote_result.take().is_some() {
            log::debug!("Edit invalidated the backend render");
        }
    }

    /// Ask `loader` for the current source's image. `None` without a source.
    pub fn request_image_load(&mut self, loader: &ImageLoader) -> Result<Option<LoadTicket>> {
        let Some(source) = &self.source else {
            return Ok(None);
        };
        let ticket = loader.load(source.location())?;
        self.latest_load = Some(ticket);
        Ok(Some(ticket))
    }

    /// Accept a completion from the loader's sink.
    ///
    /// Only the completion for the latest requested ticket is applied; older
    /// ones are dropped even if they arrive last.
    pub fn apply_load(&mut self, completion: LoadCompletion) -> LoadOutcome {
        if self.latest_load != Some(completion.ticket) {
            log::debug!("Dropping stale image load #{}", completion.ticket.0);
            return LoadOutcome::Stale;
        }
        self.latest_load = None;
        match completion.result {
            Ok(image) => {
                self.image = Some(image);
                self.invalidate_result();
                LoadOutcome::Applied
            }
            Err(e) => {
                log::warn!("Could not load {}: {}", completion.location, e);
                LoadOutcome::Failed(e.to_string())
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.latest_load.is_some()
    }

    // --- text lines ---

    /// Append a blank line at 50/50 and return its id.
    pub fn add_text_line(&mut self) -> TextLineId {
        let id = TextLineId(self.next_id);
        self.next_id += 1;
        self.lines.push(TextLine::new(id));
        self.invalidate_result();
        id
    }

    /// The line with `id`, for editing. Any edit drops the remote result.
    fn line_mut(&mut self, id: TextLineId) -> Option<&mut TextLine> {
        let idx = self.lines.iter().position(|l| l.id == id)?;
        self.invalidate_result();
        Some(&mut self.lines[idx])
    }

    pub fn update_text(&mut self, id: TextLineId, text: impl Into<String>) -> bool {
        match self.line_mut(id) {
            Some(line) => {
                line.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Clamped into [10, 90].
    pub fn set_vertical_position(&mut self, id: TextLineId, pct: u32) -> bool {
        match self.line_mut(id) {
            Some(line) => {
                line.vertical_position = clamp_position(pct);
                true
            }
            None => false,
        }
    }

    /// Clamped into [10, 90].
    pub fn set_horizontal_position(&mut self, id: TextLineId, pct: u32) -> bool {
        match self.line_mut(id) {
            Some(line) => {
                line.horizontal_position = clamp_position(pct);
                true
            }
            None => false,
        }
    }

    /// Remove exactly the line with `id`; the rest keep their ids and order.
    pub fn remove_text_line(&mut self, id: TextLineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != id);
        let removed = self.lines.len() != before;
        if removed {
            self.invalidate_result();
        }
        removed
    }

    // --- style ---

    pub fn set_font_family(&mut self, family: FontFamily) {
        self.style.font_family = family;
        self.invalidate_result();
    }

    /// Clamped into [16, 48].
    pub fn set_font_size(&mut self, px: u32) {
        self.style.font_size = clamp_font_size(px);
        self.invalidate_result();
    }

    /// Accepts `#rgb` / `#rrggbb`; anything else leaves the color unchanged.
    pub fn set_text_color(&mut self, color: &str) -> Result<()> {
        self.style.text_color = color.parse::<TextColor>()?;
        self.invalidate_result();
        Ok(())
    }

    // --- output ---

    /// Render the current state, or `None` while no background is decoded.
    pub fn render_preview(&self, compositor: &Compositor) -> Option<Raster> {
        let image = self.image.as_ref()?;
        Some(compositor.render(image, &self.lines, &self.style))
    }

    /// Build the backend request for the selected template.
    ///
    /// Fails with [`Error::MissingTemplate`] when a custom image (or nothing)
    /// is selected, so no request is ever sent without a template.
    pub fn create_request(&self, canvas: CanvasSize) -> Result<CreateMemeRequest> {
        let template = self.selected_template().ok_or(Error::MissingTemplate)?;
        let boxes = self
            .lines
            .iter()
            .filter(|l| !l.is_blank())
            .map(|line| {
                let rect = text_box(place_line(line, canvas), self.style.font_size, canvas);
                TextBox {
                    text: line.text.clone(),
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    color: self.style.text_color.to_hex(),
                    outline_color: TextColor::BLACK.to_hex(),
                }
            })
            .collect();
        Ok(CreateMemeRequest {
            template_id: template.id.clone(),
            boxes,
            font_family: self.style.font_family.css_name().to_string(),
            font_size: self.style.font_size,
        })
    }

    /// Build the backend request for a custom image.
    pub fn create_custom_request(&self) -> Result<CreateCustomMemeRequest> {
        let image_url = self
            .custom_image()
            .ok_or_else(|| Error::InvalidInput("no custom image selected".into()))?;
        Ok(CreateCustomMemeRequest {
            image_url: image_url.to_string(),
            text_lines: self.lines.clone(),
            font_family: self.style.font_family.css_name().to_string(),
            font_size: self.style.font_size,
            text_color: self.style.text_color.to_hex(),
        })
    }

    pub fn record_result(&mut self, created: CreatedMeme) {
        log::info!("Backend rendered meme at {}", created.url);
        self.remote_result = Some(created);
    }

    /// The remote result when there is one, otherwise a locally rendered PNG.
    ///
    /// The remote result is dropped by every edit after it was recorded, so
    /// it is only returned while it still matches the preview.
    pub fn export(&self, compositor: &Compositor) -> Result<Export> {
        if let Some(created) = &self.remote_result {
            return Ok(Export::Remote(created.url.clone()));
        }
        let raster = self
            .render_preview(compositor)
            .ok_or_else(|| Error::RenderError("no image loaded".into()))?;
        Ok(Export::Local(raster.to_png()?))
    }
}

impl Default for MemeEditor {
    fn default() -> Self {
        Self::new()
    }
}
