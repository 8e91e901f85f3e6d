use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cardwizard_contracts::creature::CreatureData;
use cardwizard_contracts::events::{EventPayload, EventWriter};
use cardwizard_contracts::models::ModelSelector;
use image::{Rgb, RgbImage};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

mod journal;
mod session;

pub use journal::{CardJournal, CardVersion};
pub use session::{EditOutcome, GenerateOutcome, WizardSession};

/// Generated cards keep the vertical trading-card aspect.
pub const CARD_ASPECT_RATIO: &str = "3:4";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// An encoded image artifact: the confirmed sketch on the way in, the
/// rendered card on the way out. Replaced wholesale on every successful
/// generate/edit, never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct CardImage {
    pub base64: String,
    pub mime: String,
}

impl CardImage {
    pub fn new(base64: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime: mime.into(),
        }
    }

    /// Accepts either a `data:` URI or a bare base64 payload. Bare payloads
    /// take the supplied fallback mime.
    pub fn from_data_uri(raw: &str, fallback_mime: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix("data:") {
            if let Some((header, payload)) = rest.split_once(',') {
                let mime = header
                    .split(';')
                    .next()
                    .filter(|value| !value.is_empty())
                    .unwrap_or(fallback_mime);
                return Self::new(payload, mime);
            }
        }
        Self::new(trimmed, fallback_mime)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.base64.as_bytes())
            .context("card image base64 decode failed")
    }

    pub fn is_empty(&self) -> bool {
        self.base64.trim().is_empty()
    }

    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

/// One render call: the reference image plus the full instruction text.
/// Generation attaches the sketch; editing attaches the current card.
#[derive(Debug, Clone)]
pub struct CardRenderRequest {
    pub prompt: String,
    pub image: CardImage,
    pub model: String,
    pub aspect_ratio: String,
}

pub trait CardProvider: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &CardRenderRequest) -> Result<CardImage>;
    fn edit(&self, request: &CardRenderRequest) -> Result<CardImage>;
}

#[derive(Default)]
pub struct CardProviderRegistry {
    providers: BTreeMap<String, Box<dyn CardProvider>>,
}

impl CardProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: CardProvider + 'static>(&mut self, provider: P) {
        self.providers
            .insert(provider.name().to_string(), Box::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&dyn CardProvider> {
        self.providers.get(name).map(|provider| provider.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

pub fn default_provider_registry() -> CardProviderRegistry {
    let mut registry = CardProviderRegistry::new();
    registry.register(DryrunCardProvider);
    registry.register(GeminiCardProvider::new());
    registry
}

/// Offline renderer: a deterministic solid-tint card derived from the
/// prompt, so the wizard runs end-to-end without credentials.
pub struct DryrunCardProvider;

impl DryrunCardProvider {
    fn render(&self, request: &CardRenderRequest) -> Result<CardImage> {
        let (r, g, b) = color_from_prompt(&request.prompt);
        let mut canvas = RgbImage::new(768, 1024);
        for pixel in canvas.pixels_mut() {
            *pixel = Rgb([r, g, b]);
        }
        // Lighter header band where a real card would carry name and HP.
        for y in 0..96 {
            for x in 0..768 {
                let Rgb([cr, cg, cb]) = *canvas.get_pixel(x, y);
                canvas.put_pixel(
                    x,
                    y,
                    Rgb([
                        cr.saturating_add(64),
                        cg.saturating_add(64),
                        cb.saturating_add(64),
                    ]),
                );
            }
        }
        let mut bytes: Vec<u8> = Vec::new();
        canvas
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .context("dryrun card encode failed")?;
        Ok(CardImage::new(BASE64.encode(bytes), "image/png"))
    }
}

impl CardProvider for DryrunCardProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(&self, request: &CardRenderRequest) -> Result<CardImage> {
        self.render(request)
    }

    fn edit(&self, request: &CardRenderRequest) -> Result<CardImage> {
        self.render(request)
    }
}

/// The single external service adapter: multimodal Gemini image generation.
/// Both operations post the same shape (one inline image part plus the
/// instruction text) and differ only in prompt content.
pub struct GeminiCardProvider {
    api_base: String,
    http: HttpClient,
}

impl GeminiCardProvider {
    pub fn new() -> Self {
        Self {
            api_base: env::var("GEMINI_API_BASE")
                .ok()
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            http: HttpClient::new(),
        }
    }

    fn api_key() -> Option<String> {
        non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"))
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn build_payload(request: &CardRenderRequest) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": request.image.mime,
                            "data": request.image.base64,
                        }
                    },
                    { "text": request.prompt },
                ],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": {
                    "aspectRatio": request.aspect_ratio,
                },
            },
        })
    }

    // Single attempt per user action; no transport retries.
    fn render(&self, request: &CardRenderRequest) -> Result<CardImage> {
        let Some(api_key) = Self::api_key() else {
            bail!("GEMINI_API_KEY or GOOGLE_API_KEY not set");
        };
        let endpoint = self.endpoint_for_model(&request.model);
        let payload = Self::build_payload(request);
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        let response_payload = response_json_or_error("Gemini", response)?;
        let Some(card) = extract_inline_image(&response_payload) else {
            bail!("Gemini returned no card image");
        };
        Ok(card)
    }
}

impl Default for GeminiCardProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CardProvider for GeminiCardProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, request: &CardRenderRequest) -> Result<CardImage> {
        self.render(request)
    }

    fn edit(&self, request: &CardRenderRequest) -> Result<CardImage> {
        self.render(request)
    }
}

/// Walk `candidates[].content.parts[].inlineData` and return the first
/// image payload. Both casings appear in the wild.
fn extract_inline_image(response_payload: &Value) -> Option<CardImage> {
    let candidates = response_payload.get("candidates")?.as_array()?;
    for candidate in candidates {
        let Some(parts) = candidate
            .get("content")
            .and_then(Value::as_object)
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
        else {
            continue;
        };
        for part in parts {
            let Some(inline) = part
                .get("inlineData")
                .or_else(|| part.get("inline_data"))
                .and_then(Value::as_object)
            else {
                continue;
            };
            let data = inline
                .get("data")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if data.is_empty() {
                continue;
            }
            let mime = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .unwrap_or("image/png");
            return Some(CardImage::new(data, mime));
        }
    }
    None
}

/// Build the full generation instruction from every collected field plus the
/// fixed layout/orientation/printing constraints.
pub fn build_card_prompt(creature: &CreatureData) -> String {
    let color_instruction = if creature.selected_colors.is_empty() {
        "Use colors that match the element type.".to_string()
    } else {
        format!(
            "Primary Colors to use: {}. Color Harmony Strategy: {}.",
            creature.selected_colors.join(", "),
            creature.color_harmony
        )
    };

    format!(
        "Generate a vertical Trading Card Game card (3:4 aspect ratio) based on the attached sketch.\n\
         \n\
         Card Data to Display (Must be legible):\n\
         - Name: \"{name}\" (Place at the top)\n\
         - HP: \"{hp} HP\" (Place at the top right)\n\
         - Element: \"{element}\" (Theme the card border/background around this)\n\
         - Attack Move: \"{ability}\" (Place in the lower text box)\n\
         - Damage: \"{damage}\" (Place next to the attack)\n\
         - Flavor Text: \"{description}\" (Small text at the bottom)\n\
         \n\
         Design Instructions:\n\
         1. ORIENTATION: Vertical (Portrait). The card must be taller than it is wide.\n\
         2. LAYOUT: Standard monster card layout. Top Header: Name and HP. Center: large, \
         vibrant illustration of the monster. Bottom Panel: Attack details, Damage number, and Description.\n\
         3. ART STYLE: High-quality, vibrant 3D render style, similar to popular monster collecting card games.\n\
         4. SKETCH INTERPRETATION: {features}. The \"scribbles\" in the sketch should be interpreted \
         as textures, energy, or specific body parts as described.\n\
         5. COLORS: {colors}\n\
         \n\
         IMPORTANT PRINTING INSTRUCTIONS:\n\
         - The card edges must be CLEAN, SOLID, and FLAT.\n\
         - DO NOT ADD grunge, dirt, wear, tear, or realistic paper texture to the card border/frame.\n\
         - This image will be printed and laminated, so it needs to look like a digital vector asset \
         (pristine condition), not a photo of an old card.\n\
         - NO background surface (no table, wood, or paper backdrop).\n\
         - NO perspective tilt; keep the card flat and front-facing (2D view).\n\
         - Crop perfectly to the card edge.",
        name = creature.name,
        hp = creature.hp,
        element = creature.element,
        ability = creature.special_ability,
        damage = creature.special_ability_damage,
        description = creature.description,
        features = creature.sketch_features,
        colors = color_instruction,
    )
}

/// Build the instruction for editing an existing card in place.
pub fn build_edit_prompt(instruction: &str) -> String {
    format!(
        "Edit this trading card image based on: \"{instruction}\".\n\
         \n\
         Instructions:\n\
         - Maintain the Vertical (Portrait) aspect ratio (3:4).\n\
         - Keep the \"Trading Card\" layout with clear text sections for Name, HP, and Attack.\n\
         - Ensure the text remains legible and consistent with the previous design.\n\
         - If the user asks to change the color, element, or features, update the monster \
         illustration accordingly.\n\
         - Maintain the high-quality, vibrant 3D art style.\n\
         \n\
         IMPORTANT PRINTING INSTRUCTIONS:\n\
         - The output must remain perfectly cropped to the card edges.\n\
         - Clean, solid borders. No grunge texture. No table background.\n\
         - Keep the view flat and front-facing (digital asset style)."
    )
}

/// Service layer the orchestrator talks to: resolves the configured model,
/// performs the external call through the registered provider, journals each
/// version, writes artifact files, and emits events along the way.
pub struct CardStudio {
    out_dir: PathBuf,
    events: EventWriter,
    journal: CardJournal,
    selector: ModelSelector,
    model: Option<String>,
    providers: CardProviderRegistry,
    artifact_seq: u64,
    last_version_id: Option<String>,
}

impl CardStudio {
    pub fn new(
        out_dir: impl Into<PathBuf>,
        events_path: impl Into<PathBuf>,
        model: Option<String>,
    ) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)?;
        let session_id = out_dir
            .file_name()
            .and_then(|value| value.to_str())
            .filter(|value| !value.is_empty())
            .unwrap_or("wizard-session")
            .to_string();
        let events = EventWriter::new(events_path.into(), session_id);
        let journal_path = out_dir.join("journal.json");
        let journal = if journal_path.exists() {
            CardJournal::load(&journal_path)
        } else {
            CardJournal::new(&journal_path)
        };

        events.emit(
            "session_started",
            map_object(json!({
                "out_dir": out_dir.to_string_lossy().to_string(),
            })),
        )?;

        Ok(Self {
            out_dir,
            events,
            journal,
            selector: ModelSelector::new(None),
            model,
            providers: default_provider_registry(),
            artifact_seq: 0,
            last_version_id: None,
        })
    }

    /// Swap the provider registry; used to wire stand-ins in tests.
    pub fn with_providers(mut self, providers: CardProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    pub fn set_model(&mut self, model: Option<String>) {
        self.model = model;
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn out_dir(&self) -> &std::path::Path {
        &self.out_dir
    }

    pub fn journal(&self) -> &CardJournal {
        &self.journal
    }

    pub fn event_writer(&self) -> EventWriter {
        self.events.clone()
    }

    pub fn emit_event(&self, event_type: &str, payload: EventPayload) -> Result<Value> {
        self.events.emit(event_type, payload)
    }

    /// Initial generation: full creature description plus the confirmed
    /// sketch. The caller owns recovery; this reports success or one error.
    pub fn generate_card(&mut self, creature: &CreatureData) -> Result<CardImage> {
        let Some(sketch_raw) = creature.sketch_base64.as_deref() else {
            bail!("no sketch attached");
        };
        let sketch = CardImage::from_data_uri(sketch_raw, "image/jpeg");
        let prompt = build_card_prompt(creature);
        let request_payload = map_object(json!({
            "element": creature.element.label(),
            "colors": creature.selected_colors.clone(),
            "harmony": creature.color_harmony.label(),
        }));
        self.render_version("generate", "card", prompt, sketch, request_payload, None)
    }

    /// Edit pass: the current artifact plus a free-text instruction. The
    /// previous artifact file stays on disk untouched.
    pub fn edit_card(&mut self, card: &CardImage, instruction: &str) -> Result<CardImage> {
        let prompt = build_edit_prompt(instruction);
        let request_payload = map_object(json!({
            "instruction": instruction,
        }));
        let parent = self.last_version_id.clone();
        self.render_version("edit", "edit", prompt, card.clone(), request_payload, parent)
    }

    fn render_version(
        &mut self,
        action: &str,
        capability: &str,
        prompt: String,
        reference: CardImage,
        mut request_payload: EventPayload,
        parent_version_id: Option<String>,
    ) -> Result<CardImage> {
        let selection = self
            .selector
            .select(self.model.as_deref(), capability)
            .map_err(anyhow::Error::msg)?;
        if let Some(reason) = selection.fallback_reason.as_deref() {
            self.events.emit(
                "model_fallback",
                map_object(json!({ "reason": reason })),
            )?;
        }
        let model_spec = selection.model;

        request_payload.insert("model".to_string(), Value::String(model_spec.name.clone()));
        request_payload.insert(
            "provider".to_string(),
            Value::String(model_spec.provider.clone()),
        );
        self.events
            .emit(&format!("{action}_requested"), request_payload)?;

        let Some(provider) = self.providers.get(&model_spec.provider) else {
            let available = self.providers.names().join(", ");
            let error = format!(
                "provider '{}' not registered (available: [{}])",
                model_spec.provider, available
            );
            self.events.emit(
                &format!("{action}_failed"),
                map_object(json!({ "error": error })),
            )?;
            bail!("{error}");
        };

        let request = CardRenderRequest {
            prompt: prompt.clone(),
            image: reference,
            model: model_spec.name.clone(),
            aspect_ratio: CARD_ASPECT_RATIO.to_string(),
        };
        let rendered = match action {
            "edit" => provider.edit(&request),
            _ => provider.generate(&request),
        };
        let card = match rendered {
            Ok(card) => card,
            Err(err) => {
                self.events.emit(
                    &format!("{action}_failed"),
                    map_object(json!({
                        "model": model_spec.name,
                        "error": error_chain_text(&err, 400),
                    })),
                )?;
                return Err(err);
            }
        };

        self.artifact_seq += 1;
        let artifact_path = self
            .out_dir
            .join(format!("card-{:02}.{}", self.artifact_seq, card.extension()));
        fs::write(&artifact_path, card.decode()?)
            .with_context(|| format!("failed to write {}", artifact_path.display()))?;

        let fingerprint = request_fingerprint(&model_spec.name, &prompt);
        let version = self.journal.add_version(
            action,
            &prompt,
            &fingerprint,
            parent_version_id.as_deref(),
            Some(artifact_path.to_string_lossy().as_ref()),
        );
        let version_id = version.version_id.clone();
        self.journal.save()?;
        self.last_version_id = Some(version_id.clone());

        self.events.emit(
            if action == "edit" {
                "card_edited"
            } else {
                "card_generated"
            },
            map_object(json!({
                "version_id": version_id,
                "artifact_path": artifact_path.to_string_lossy().to_string(),
                "fingerprint": fingerprint,
            })),
        )?;

        Ok(card)
    }

    /// The download action: serialize the current artifact under a filename
    /// derived from the creature's name.
    pub fn save_card(&self, card: &CardImage, creature_name: &str) -> Result<PathBuf> {
        let path = self.out_dir.join(format!(
            "{}-card.{}",
            sanitize_file_stem(creature_name),
            card.extension()
        ));
        fs::write(&path, card.decode()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch
            } else {
                '-'
            }
        })
        .collect();
    let collapsed = cleaned
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<&str>>()
        .join("-");
    if collapsed.is_empty() {
        "creature".to_string()
    } else {
        collapsed
    }
}

fn request_fingerprint(model: &str, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update(b"\n");
    hasher.update(prompt.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

fn color_from_prompt(prompt: &str) -> (u8, u8, u8) {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let digest = hasher.finalize();
    (digest[0], digest[1], digest[2])
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use cardwizard_contracts::creature::{ColorHarmony, MonsterType};

    use super::*;

    fn sample_creature() -> CreatureData {
        CreatureData {
            name: "Blaze".to_string(),
            element: MonsterType::Fire,
            hp: 60,
            description: "lives in volcanoes".to_string(),
            special_ability: "Flame Burst".to_string(),
            special_ability_damage: 40,
            sketch_base64: Some("data:image/jpeg;base64,c2tldGNo".to_string()),
            sketch_features: "circle eyes".to_string(),
            selected_colors: vec!["Red".to_string(), "Orange".to_string()],
            color_harmony: ColorHarmony::Contrast,
        }
    }

    #[test]
    fn data_uri_round_trip_preserves_payload_and_mime() {
        let card = CardImage::new("QUJD", "image/png");
        let uri = card.to_data_uri();
        assert_eq!(uri, "data:image/png;base64,QUJD");
        let parsed = CardImage::from_data_uri(&uri, "image/jpeg");
        assert_eq!(parsed, card);
    }

    #[test]
    fn bare_base64_takes_the_fallback_mime() {
        let parsed = CardImage::from_data_uri("QUJD", "image/jpeg");
        assert_eq!(parsed.base64, "QUJD");
        assert_eq!(parsed.mime, "image/jpeg");
        assert_eq!(parsed.extension(), "jpg");
        assert_eq!(parsed.decode().unwrap(), b"ABC");
    }

    #[test]
    fn generation_prompt_carries_every_creature_field() {
        let creature = sample_creature();
        let prompt = build_card_prompt(&creature);
        assert!(prompt.contains("\"Blaze\""));
        assert!(prompt.contains("60 HP"));
        assert!(prompt.contains("\"Fire\""));
        assert!(prompt.contains("\"Flame Burst\""));
        assert!(prompt.contains("\"40\""));
        assert!(prompt.contains("lives in volcanoes"));
        assert!(prompt.contains("circle eyes"));
        assert!(prompt.contains("Primary Colors to use: Red, Orange."));
        assert!(prompt.contains("Color Harmony Strategy: Contrast."));
    }

    #[test]
    fn empty_color_selection_falls_back_to_element_colors() {
        let mut creature = sample_creature();
        creature.selected_colors.clear();
        let prompt = build_card_prompt(&creature);
        assert!(prompt.contains("Use colors that match the element type."));
        assert!(!prompt.contains("Primary Colors to use"));
    }

    #[test]
    fn extract_inline_image_handles_both_casings() {
        let camel = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "here you go" },
                        { "inlineData": { "mimeType": "image/png", "data": "QUJD" } },
                    ]
                }
            }]
        });
        let card = extract_inline_image(&camel).unwrap();
        assert_eq!(card.base64, "QUJD");
        assert_eq!(card.mime, "image/png");

        let snake = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "inline_data": { "mime_type": "image/jpeg", "data": "REVG" } },
                    ]
                }
            }]
        });
        let card = extract_inline_image(&snake).unwrap();
        assert_eq!(card.mime, "image/jpeg");

        assert!(extract_inline_image(&json!({ "candidates": [] })).is_none());
        assert!(extract_inline_image(&json!({})).is_none());
    }

    #[test]
    fn dryrun_cards_are_deterministic_per_prompt() -> Result<()> {
        let provider = DryrunCardProvider;
        let request = CardRenderRequest {
            prompt: "a prompt".to_string(),
            image: CardImage::new("QUJD", "image/jpeg"),
            model: "dryrun-card-1".to_string(),
            aspect_ratio: CARD_ASPECT_RATIO.to_string(),
        };
        let first = provider.generate(&request)?;
        let second = provider.generate(&request)?;
        assert_eq!(first, second);
        assert_eq!(first.mime, "image/png");
        assert!(!first.is_empty());

        let mut other = request.clone();
        other.prompt = "another prompt".to_string();
        assert_ne!(provider.generate(&other)?, first);
        Ok(())
    }

    #[test]
    fn studio_generates_journals_and_writes_an_artifact() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let out_dir = temp.path().join("session");
        let mut studio = CardStudio::new(
            &out_dir,
            out_dir.join("events.jsonl"),
            Some("dryrun-card-1".to_string()),
        )?;

        let creature = sample_creature();
        let card = studio.generate_card(&creature)?;
        assert!(!card.is_empty());
        assert_eq!(studio.journal().versions.len(), 1);
        let version = &studio.journal().versions[0];
        assert_eq!(version.action, "generate");
        assert!(version.parent_version_id.is_none());
        let artifact = version.artifact_path.clone().unwrap();
        assert!(std::path::Path::new(&artifact).exists());

        let edited = studio.edit_card(&card, "make it green")?;
        assert!(!edited.is_empty());
        let versions = &studio.journal().versions;
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].action, "edit");
        assert_eq!(
            versions[1].parent_version_id.as_deref(),
            Some(versions[0].version_id.as_str())
        );
        assert!(versions[1].prompt_diff.is_some());
        assert_ne!(versions[0].fingerprint, versions[1].fingerprint);

        let events = std::fs::read_to_string(out_dir.join("events.jsonl"))?;
        let types: Vec<String> = events
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .filter_map(|event| event["type"].as_str().map(str::to_string))
            .collect();
        assert!(types.contains(&"session_started".to_string()));
        assert!(types.contains(&"generate_requested".to_string()));
        assert!(types.contains(&"card_generated".to_string()));
        assert!(types.contains(&"card_edited".to_string()));
        Ok(())
    }

    #[test]
    fn generate_without_a_sketch_is_an_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let out_dir = temp.path().join("session");
        let mut studio = CardStudio::new(
            &out_dir,
            out_dir.join("events.jsonl"),
            Some("dryrun-card-1".to_string()),
        )?;
        let mut creature = sample_creature();
        creature.sketch_base64 = None;
        assert!(studio.generate_card(&creature).is_err());
        Ok(())
    }

    #[test]
    fn unknown_model_falls_back_and_logs_the_reason() -> Result<()> {
        // Fallback lands on the gemini default, which has no credentials in
        // tests; register a dryrun stand-in under the same provider name.
        struct RenamedDryrun;
        impl CardProvider for RenamedDryrun {
            fn name(&self) -> &str {
                "gemini"
            }
            fn generate(&self, request: &CardRenderRequest) -> Result<CardImage> {
                DryrunCardProvider.generate(request)
            }
            fn edit(&self, request: &CardRenderRequest) -> Result<CardImage> {
                DryrunCardProvider.edit(request)
            }
        }
        let mut providers = CardProviderRegistry::new();
        providers.register(RenamedDryrun);

        let temp = tempfile::tempdir()?;
        let out_dir = temp.path().join("session");
        let mut studio = CardStudio::new(
            &out_dir,
            out_dir.join("events.jsonl"),
            Some("made-up-model".to_string()),
        )?
        .with_providers(providers);

        studio.generate_card(&sample_creature())?;
        let events = std::fs::read_to_string(out_dir.join("events.jsonl"))?;
        assert!(events.contains("model_fallback"));
        assert!(events.contains("made-up-model"));
        Ok(())
    }

    #[test]
    fn file_stems_are_sanitized_for_download() {
        assert_eq!(sanitize_file_stem("Blaze"), "Blaze");
        assert_eq!(sanitize_file_stem("Mr. Spark!"), "Mr-Spark");
        assert_eq!(sanitize_file_stem("  "), "creature");
    }

    #[test]
    fn save_card_uses_the_creature_name() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let out_dir = temp.path().join("session");
        let studio = CardStudio::new(
            &out_dir,
            out_dir.join("events.jsonl"),
            Some("dryrun-card-1".to_string()),
        )?;
        let card = CardImage::new(BASE64.encode(b"png-bytes"), "image/png");
        let path = studio.save_card(&card, "Blaze")?;
        assert!(path.ends_with("Blaze-card.png"));
        assert_eq!(std::fs::read(path)?, b"png-bytes");
        Ok(())
    }
}
