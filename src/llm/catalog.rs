use super::dispatch::ProviderKind;
use super::samurai_v2::SAMURAI_V2_MODEL;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Model {
    pub id: &'static str,
    pub provider: ProviderKind,
    pub supports_live_search: bool,
    pub is_reasoning: bool,
    pub coming_soon: bool,
}

impl Model {
    const fn samurai(id: &'static str) -> Self {
        Self {
            id,
            provider: ProviderKind::Samurai,
            supports_live_search: true,
            is_reasoning: false,
            coming_soon: false,
        }
    }

    const fn via(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    /// Last `/`-separated segment of the id.
    pub fn name(&self) -> &'static str {
        self.id.rsplit('/').next().unwrap_or(self.id)
    }

    /// Everything before the last `/`, or `Unknown` for bare ids.
    pub fn vendor(&self) -> &'static str {
        self.id.rsplit_once('/').map_or("Unknown", |(vendor, _)| vendor)
    }
}

pub static MODELS: &[Model] = &[
    Model::samurai(SAMURAI_V2_MODEL).via(ProviderKind::SamuraiV2),
    Model::samurai("openai/gpt-4.1-mini"),
    Model::samurai("rerank-shopify-v0"),
    Model::samurai("qwen-plus-latest"),
    Model::samurai("deepseek-ai/DeepSeek-R1-Distill-Qwen-32B"),
    Model::samurai("Qwen-QwQ-32B-Preview"),
    Model::samurai("Qwen/QwQ-32B"),
    Model::samurai("text-embedding-3-large"),
    Model::samurai("nai-4b"),
    Model::samurai("deepseek-r1"),
    Model::samurai("gpt-4o"),
    Model::samurai("gpt-4o-latest"),
    Model::samurai("gemini-1.5-pro"),
    Model::samurai("gemini-1.5-pro-latest"),
    Model::samurai("gemini-flash-2.0"),
    Model::samurai("gemini-1.5-flash"),
    Model::samurai("anthropic/claude-3.5-sonnet"),
    Model::samurai("mistral-large"),
    Model::samurai("deepseek-v3"),
    Model::samurai("openai/gpt-4.1"),
    Model::samurai("openai/gpt-4.1-nano"),
    Model::samurai("openai/chatgpt-4o-latest"),
    Model::samurai("llama-3.1-405b"),
    Model::samurai("Meta-Llama-3.1-405B-Instruct-Turbo"),
    Model::samurai("Meta-Llama-3.3-70B-Instruct-Turbo"),
    Model::samurai("qwen-turbo-latest"),
    Model::samurai("dbrx-instruct"),
    Model::samurai("qwen-2.5-32b"),
    Model::samurai("qwen-2.5-coder-32b"),
    Model::samurai("qwen-qwq-32b"),
    Model::samurai("o3-mini"),
    Model::samurai("Claude-sonnet-3.7"),
    Model::samurai("x-ai/grok-3-beta"),
    Model::samurai("openai/gpt-4o-search-preview"),
    Model::samurai("openai/gpt-4o-mini-search-preview"),
    Model::samurai("DeepResearch"),
    Model::samurai("uncensored-r1"),
    Model::samurai("gpt-4.1-2025-04-14"),
    Model::samurai("perplexity-ai/r1-1776"),
    Model::samurai("Qwen/Qwen3-235B-A22B-fp8-tput"),
    Model::samurai("deepseek-ai/DeepSeek-V3-0324"),
    Model::samurai("o1"),
    Model::samurai("o1-2024-12-17"),
    Model::samurai("o1-preview-2024-09-12"),
    Model::samurai("o3-mini-2025-01-31"),
];

pub fn find_model(id: &str) -> Option<&'static Model> {
    MODELS.iter().find(|model| model.id == id)
}

pub const DEFAULT_MODEL_ID: &str = "openai/chatgpt-4o-latest";

/// The model used when neither the caller nor the config names one.
pub fn default_model() -> &'static Model {
    find_model(DEFAULT_MODEL_ID).unwrap_or(&MODELS[0])
}

const CODE_WORDS: [&str; 4] = ["code", "programming", "function", "debug"];
const REASONING_WORDS: [&str; 4] = ["explain", "why", "how", "analyze"];
const SPEED_WORDS: [&str; 3] = ["quick", "fast", "simple"];
const VISUAL_WORDS: [&str; 3] = ["image", "picture", "visual"];

fn mentions(query: &str, words: &[&str]) -> bool {
    words.iter().any(|word| query.contains(word))
}

pub fn score_model(model: &Model, query: &str) -> i32 {
    let query = query.to_lowercase();
    let name = model.name().to_lowercase();
    let mut score = 0;

    if model.supports_live_search {
        score += 10;
    }
    if mentions(&query, &CODE_WORDS) && model.id.contains("codestral") {
        score += 30;
    }
    if mentions(&query, &REASONING_WORDS) && model.is_reasoning {
        score += 25;
    }
    if mentions(&query, &SPEED_WORDS) && name.contains("flash") {
        score += 20;
    }
    if mentions(&query, &VISUAL_WORDS) && name.contains("vl") {
        score += 25;
    }
    score
}

/// Pick the best available model for a free-text query.
///
/// Ties keep catalog order.
pub fn select_best_model(query: &str) -> &'static Model {
    select_from(MODELS, query).unwrap_or_else(default_model)
}

fn select_from<'m>(models: &'m [Model], query: &str) -> Option<&'m Model> {
    let mut best: Option<(&Model, i32)> = None;
    for model in models.iter().filter(|model| !model.coming_soon) {
        let score = score_model(model, query);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((model, score));
        }
    }
    best.map(|(model, _)| model)
}
