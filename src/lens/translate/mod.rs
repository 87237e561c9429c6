//! Natural-language to SQL translation
//!
//! `TranslationEngine` wraps a sequence-to-sequence model behind a lock. The
//! model keeps mutable decoding state, so only one generation runs at a time.
//! Every call carries a deadline that the backend checks between decoding
//! steps, and the decoded text has any leftover control tokens removed.
//!
//! The production backend is a T5 checkpoint run with candle (feature `t5`).
//! [`TranslationEngine::load`] builds it once per process; later calls return
//! the same engine.

#[cfg(feature = "t5")]
mod t5;

#[cfg(feature = "t5")]
pub use t5::T5Model;

use crate::error::ConsoleResult;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[cfg(feature = "t5")]
use crate::config::SqlscribeConfig;
#[cfg(feature = "t5")]
use crate::error::ConsoleError;
#[cfg(feature = "t5")]
use std::sync::{Arc, OnceLock};

/// Per-call limits handed to the backend
#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    /// Upper bound on the decoder sequence, start token included
    pub max_output_tokens: usize,
    /// `None` when the timeout is too large to represent
    pub deadline: Option<Instant>,
    /// Budget the deadline was derived from, for error reporting
    pub timeout: Duration,
}

impl GenerationOptions {
    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// A text-to-text model producing one output string per prompt
pub trait Seq2SeqModel: Send {
    /// Generate the raw decoded output for `prompt`
    ///
    /// Implementations must give up with a timeout error once
    /// `options.deadline` has passed.
    fn generate(&mut self, prompt: &str, options: &GenerationOptions) -> ConsoleResult<String>;
}

pub struct TranslationEngine {
    model: Mutex<Box<dyn Seq2SeqModel>>,
    max_output_tokens: usize,
    timeout: Duration,
}

#[cfg(feature = "t5")]
static ENGINE: OnceLock<Arc<TranslationEngine>> = OnceLock::new();
#[cfg(feature = "t5")]
static ENGINE_INIT: Mutex<()> = Mutex::new(());

impl TranslationEngine {
    pub fn new(model: Box<dyn Seq2SeqModel>, max_output_tokens: usize, timeout: Duration) -> Self {
        Self {
            model: Mutex::new(model),
            max_output_tokens,
            timeout,
        }
    }

    /// Load the process-wide engine from `config.model_dir`
    ///
    /// The first successful call loads the tokenizer and weights; every later
    /// call returns that engine. A load failure is fatal for the caller.
    #[cfg(feature = "t5")]
    pub fn load(config: &SqlscribeConfig) -> ConsoleResult<Arc<TranslationEngine>> {
        if let Some(engine) = ENGINE.get() {
            return Ok(engine.clone());
        }
        let _init = ENGINE_INIT.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(engine) = ENGINE.get() {
            return Ok(engine.clone());
        }

        let model = T5Model::load(&config.model_dir)
            .map_err(|e| ConsoleError::FatalLoad(format!("{:#}", e)))?;
        let engine = Arc::new(Self::new(
            Box::new(model),
            config.max_output_tokens,
            config.inference_timeout(),
        ));
        Ok(ENGINE.get_or_init(|| engine).clone())
    }

    /// Translate a prompt into SQL text
    ///
    /// Any string is accepted, including an empty one. The output is not
    /// validated as SQL.
    pub fn generate(&self, prompt: &str) -> ConsoleResult<String> {
        let mut model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        let options = GenerationOptions {
            max_output_tokens: self.max_output_tokens,
            deadline: Instant::now().checked_add(self.timeout),
            timeout: self.timeout,
        };
        let started = Instant::now();
        let raw = model.generate(prompt, &options)?;
        let sql = strip_control_tokens(&raw);
        tracing::debug!(
            "generated {} chars in {:?}",
            sql.len(),
            started.elapsed()
        );
        Ok(sql)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

const CONTROL_TOKENS: [&str; 4] = ["<pad>", "</s>", "<s>", "<unk>"];
const SENTINEL_PREFIX: &str = "<extra_id_";

/// Remove model control tokens and surrounding whitespace
pub fn strip_control_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'scan: while !rest.is_empty() {
        if rest.starts_with('<') {
            for token in CONTROL_TOKENS {
                if let Some(after) = rest.strip_prefix(token) {
                    rest = after;
                    continue 'scan;
                }
            }
            if let Some(after) = rest.strip_prefix(SENTINEL_PREFIX) {
                let digits = after.bytes().take_while(u8::is_ascii_digit).count();
                if digits > 0 && after[digits..].starts_with('>') {
                    rest = &after[digits + 1..];
                    continue 'scan;
                }
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsoleError;
    use std::sync::Arc;

    /// Echoes the prompt wrapped in control tokens
    struct EchoModel;

    impl Seq2SeqModel for EchoModel {
        fn generate(&mut self, prompt: &str, _: &GenerationOptions) -> ConsoleResult<String> {
            Ok(format!("<pad> {} </s>", prompt))
        }
    }

    /// Spins until the deadline, like a backend stuck in a long decode
    struct SlowModel;

    impl Seq2SeqModel for SlowModel {
        fn generate(&mut self, _: &str, options: &GenerationOptions) -> ConsoleResult<String> {
            while !options.deadline_passed() {
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(ConsoleError::timeout("generation", options.timeout))
        }
    }

    #[test]
    fn test_strip_control_tokens() {
        assert_eq!(strip_control_tokens("<pad> SELECT 1</s>"), "SELECT 1");
        assert_eq!(
            strip_control_tokens("<extra_id_0>SELECT a<extra_id_12> FROM t<unk>"),
            "SELECT a FROM t"
        );
        assert_eq!(strip_control_tokens("a < b"), "a < b");
        assert_eq!(strip_control_tokens("<extra_id_>x"), "<extra_id_>x");
        assert_eq!(strip_control_tokens("  <s></s>  "), "");
        assert_eq!(strip_control_tokens("WHERE name = 'é'"), "WHERE name = 'é'");
    }

    #[test]
    fn test_generate_accepts_empty_prompt() {
        let engine = TranslationEngine::new(Box::new(EchoModel), 64, Duration::from_secs(1));
        assert_eq!(engine.generate("").unwrap(), "");
        assert_eq!(
            engine.generate("SELECT * FROM t").unwrap(),
            "SELECT * FROM t"
        );
    }

    #[test]
    fn test_generate_timeout_is_recoverable() {
        let engine = TranslationEngine::new(Box::new(SlowModel), 64, Duration::from_millis(20));
        let err = engine.generate("anything").unwrap_err();
        assert!(matches!(err, ConsoleError::Timeout { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_unbounded_timeout_has_no_deadline() {
        struct DeadlineCheck;

        impl Seq2SeqModel for DeadlineCheck {
            fn generate(&mut self, _: &str, options: &GenerationOptions) -> ConsoleResult<String> {
                assert!(options.deadline.is_none());
                assert!(!options.deadline_passed());
                Ok("SELECT 1".to_string())
            }
        }

        let engine = TranslationEngine::new(
            Box::new(DeadlineCheck),
            64,
            Duration::from_secs(u64::MAX),
        );
        assert_eq!(engine.generate("count rows").unwrap(), "SELECT 1");
    }

    #[test]
    fn test_concurrent_generation_is_serialized() {
        let engine = Arc::new(TranslationEngine::new(
            Box::new(EchoModel),
            64,
            Duration::from_secs(1),
        ));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = engine.clone();
                std::thread::spawn(move || engine.generate(&format!("q{}", i)).unwrap())
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), format!("q{}", i));
        }
    }
}
