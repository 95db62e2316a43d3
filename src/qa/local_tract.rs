//! Local extractive QA with tract.
//!
//! Runs a DistilBERT SQuAD ONNX export: the question and context are
//! tokenized as a pair, truncated (context side only) and padded to
//! `qa.max_seq_len`, and the model's start/end logits are turned into the
//! most probable context span no longer than `qa.max_answer_tokens`.
//! Token offsets map the span back to a verbatim slice of the context.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokenizers::{TruncationParams, TruncationStrategy};
use tract_onnx::prelude::*;

use super::{QaAnswer, QaModel};
use crate::config::QaConfig;
use crate::model_cache::ensure_cached;

type RunFn = Box<dyn Fn(TVec<TValue>) -> TractResult<TVec<TValue>> + Send + Sync>;

/// Sequence id the tokenizer assigns to the second input (the context).
const CONTEXT_SEQUENCE: usize = 1;

/// Model manifest: name -> (repo, onnx path in repo, tokenizer path in repo).
fn model_manifest(model_name: &str) -> Result<(&'static str, &'static str, &'static str)> {
    match model_name {
        "distilbert-base-uncased-distilled-squad" => Ok((
            "Xenova/distilbert-base-uncased-distilled-squad",
            "onnx/model.onnx",
            "tokenizer.json",
        )),
        "distilbert-base-cased-distilled-squad" => Ok((
            "Xenova/distilbert-base-cased-distilled-squad",
            "onnx/model.onnx",
            "tokenizer.json",
        )),
        other => bail!(
            "Unknown local QA model: '{}'. Supported models: \
             distilbert-base-uncased-distilled-squad, distilbert-base-cased-distilled-squad",
            other
        ),
    }
}

struct Loaded {
    tokenizer: tokenizers::Tokenizer,
    run: RunFn,
    max_seq_len: usize,
}

pub struct LocalQaModel {
    model_name: String,
    max_answer_tokens: usize,
    loaded: Arc<Loaded>,
}

impl LocalQaModel {
    pub async fn load(config: &QaConfig) -> Result<Self> {
        let name = config.model.clone();
        let max_seq_len = config.max_seq_len;

        tracing::info!(model = %name, "loading local QA model");
        let loaded =
            tokio::task::spawn_blocking(move || load_model(&name, max_seq_len)).await??;

        Ok(Self {
            model_name: config.model.clone(),
            max_answer_tokens: config.max_answer_tokens,
            loaded: Arc::new(loaded),
        })
    }
}

fn load_model(model_name: &str, max_seq_len: usize) -> Result<Loaded> {
    let (repo, onnx_rel, tokenizer_rel) = model_manifest(model_name)?;
    let (onnx_path, tokenizer_path) = ensure_cached(model_name, repo, onnx_rel, tokenizer_rel)?;

    let mut tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| anyhow::anyhow!("Load tokenizer: {}", e))?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_seq_len,
            strategy: TruncationStrategy::OnlySecond,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("Configure truncation: {}", e))?;

    let plan = tract_onnx::onnx()
        .model_for_path(onnx_path)
        .map_err(|e| anyhow::anyhow!("Load ONNX: {}", e))?
        .with_input_fact(0, i64::fact([1, max_seq_len]).into())?
        .with_input_fact(1, i64::fact([1, max_seq_len]).into())?
        .into_optimized()
        .map_err(|e| anyhow::anyhow!("Optimize: {}", e))?
        .into_runnable()
        .map_err(|e| anyhow::anyhow!("Build tract runnable: {}", e))?;

    Ok(Loaded {
        tokenizer,
        run: Box::new(move |inputs: TVec<TValue>| plan.run(inputs)),
        max_seq_len,
    })
}

#[async_trait]
impl QaModel for LocalQaModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer> {
        let loaded = self.loaded.clone();
        let max_answer_tokens = self.max_answer_tokens;
        let question = question.to_string();
        let context = context.to_string();

        tokio::task::spawn_blocking(move || {
            run_qa(&loaded, &question, &context, max_answer_tokens)
        })
        .await?
    }
}

fn run_qa(
    loaded: &Loaded,
    question: &str,
    context: &str,
    max_answer_tokens: usize,
) -> Result<QaAnswer> {
    let encoding = loaded
        .tokenizer
        .encode((question, context), true)
        .map_err(|e| anyhow::anyhow!("Tokenize: {}", e))?;

    let max_len = loaded.max_seq_len;
    let ids = encoding.get_ids();
    let len = ids.len().min(max_len);

    let mut input_ids = vec![0i64; max_len];
    let mut attention_mask = vec![0i64; max_len];
    for (j, &id) in ids.iter().take(len).enumerate() {
        input_ids[j] = id as i64;
        attention_mask[j] = 1;
    }

    let input_ids_t = Tensor::from_shape(&[1, max_len], &input_ids)?;
    let attention_mask_t = Tensor::from_shape(&[1, max_len], &attention_mask)?;
    let outputs = (loaded.run)(tvec!(input_ids_t.into(), attention_mask_t.into()))?;

    if outputs.len() < 2 {
        bail!("QA model returned {} outputs, expected start and end logits", outputs.len());
    }
    let start_logits: Vec<f32> = outputs[0]
        .to_array_view::<f32>()
        .map_err(|e| anyhow::anyhow!("Start logits: {}", e))?
        .iter()
        .copied()
        .take(len)
        .collect();
    let end_logits: Vec<f32> = outputs[1]
        .to_array_view::<f32>()
        .map_err(|e| anyhow::anyhow!("End logits: {}", e))?
        .iter()
        .copied()
        .take(len)
        .collect();

    let in_context: Vec<bool> = encoding
        .get_sequence_ids()
        .iter()
        .take(len)
        .map(|seq| *seq == Some(CONTEXT_SEQUENCE))
        .collect();

    let (first, last, score) =
        best_span(&start_logits, &end_logits, &in_context, max_answer_tokens)
            .ok_or_else(|| anyhow::anyhow!("Context has no tokens left after truncation"))?;

    let offsets = encoding.get_offsets();
    let start = offsets[first].0;
    let end = offsets[last].1;

    Ok(QaAnswer {
        answer: context.get(start..end).unwrap_or_default().to_string(),
        score,
        start,
        end,
    })
}

/// Pick the `(start, end)` token pair maximizing `p_start × p_end`.
///
/// Probabilities are softmaxed over the allowed (context) positions only.
/// Spans run forward and cover at most `max_answer_tokens` tokens. The
/// earliest span wins ties. Returns `None` when no position is allowed.
fn best_span(
    start_logits: &[f32],
    end_logits: &[f32],
    allowed: &[bool],
    max_answer_tokens: usize,
) -> Option<(usize, usize, f32)> {
    let n = start_logits.len().min(end_logits.len()).min(allowed.len());
    let p_start = masked_softmax(&start_logits[..n], &allowed[..n]);
    let p_end = masked_softmax(&end_logits[..n], &allowed[..n]);

    let mut best: Option<(usize, usize, f32)> = None;
    for i in (0..n).filter(|&i| allowed[i]) {
        for j in (i..(i + max_answer_tokens).min(n)).filter(|&j| allowed[j]) {
            let score = p_start[i] * p_end[j];
            if best.map_or(true, |(_, _, b)| score > b) {
                best = Some((i, j, score));
            }
        }
    }
    best
}

fn masked_softmax(logits: &[f32], allowed: &[bool]) -> Vec<f32> {
    let max = logits
        .iter()
        .zip(allowed)
        .filter(|(_, &a)| a)
        .map(|(&l, _)| l)
        .fold(f32::NEG_INFINITY, f32::max);

    let exps: Vec<f32> = logits
        .iter()
        .zip(allowed)
        .map(|(&l, &a)| if a { (l - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}
