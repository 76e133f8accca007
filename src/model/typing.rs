//! 打字动画：把最终文本逐字符“打”进显示缓冲区
//!
//! 每个字符一个步骤，步骤之间由虚拟时钟定时器衔接；偶尔先敲错一个字母、
//! 退格、再补上正确字符。换行后停顿加倍。同一时刻只有一个会话，
//! 新会话开始前旧会话的全部定时器都会被取消。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::model::scheduler::TimerQueue;

const TYPO_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// 打字节奏配置（毫秒）
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    /// 每个字符的基础延迟
    pub base_delay_ms: u64,
    /// 在基础延迟上均匀附加 0..=jitter 的随机延迟
    pub delay_jitter_ms: u64,
    /// 每个非换行字符敲错的概率
    pub typo_probability: f64,
    /// 退格之后补正确字符前的停顿
    pub typo_correction_delay_ms: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 50,
            delay_jitter_ms: 100,
            typo_probability: 0.10,
            typo_correction_delay_ms: 300,
        }
    }
}

impl TypingConfig {
    /// 关闭错字（测试与确定性演示用）
    pub fn without_typos(mut self) -> Self {
        self.typo_probability = 0.0;
        self
    }

    fn typo_probability(&self) -> f64 {
        if self.typo_probability.is_nan() {
            0.0
        } else {
            self.typo_probability.clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    Idle,
    Typing,
}

/// 定时器触发后要执行的动作；generation 标识所属会话
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    generation: u64,
    kind: StepKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    TypeNext,
    /// 删除刚敲错的字符
    Backspace { correct: char, delay_ms: u64 },
    /// 补上正确字符后继续
    Correct { correct: char, delay_ms: u64 },
}

#[derive(Debug)]
struct TypingSession {
    generation: u64,
    source: Vec<char>,
    source_text: String,
    cursor: usize,
}

#[derive(Debug)]
pub struct TypingAnimator<R = StdRng> {
    config: TypingConfig,
    rng: R,
    timers: TimerQueue<Step>,
    session: Option<TypingSession>,
    display: String,
    generation: u64,
    revealed_steps: usize,
}

impl TypingAnimator<StdRng> {
    pub fn new(config: TypingConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> TypingAnimator<R> {
    pub fn with_rng(config: TypingConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            timers: TimerQueue::new(),
            session: None,
            display: String::new(),
            generation: 0,
            revealed_steps: 0,
        }
    }

    pub fn config(&self) -> &TypingConfig {
        &self.config
    }

    /// 替换配置；对下一个会话生效
    pub fn set_config(&mut self, config: TypingConfig) {
        self.config = config;
    }

    /// 开始新会话：取消旧会话的全部定时器、清空缓冲区，然后同步执行第一步
    pub fn start_session(&mut self, text: &str) {
        self.reset();
        self.session = Some(TypingSession {
            generation: self.generation,
            source: text.chars().collect(),
            source_text: text.to_string(),
            cursor: 0,
        });
        tracing::debug!("开始打字会话 #{}，共 {} 个字符", self.generation, text.chars().count());
        self.type_next();
    }

    /// 视图销毁：取消定时器并清空，回到 Idle
    pub fn cancel(&mut self) {
        self.reset();
    }

    /// 推进虚拟时钟 elapsed 毫秒，按顺序执行所有到期步骤，返回执行的步骤数
    pub fn advance(&mut self, elapsed_ms: u64) -> usize {
        let until = self.timers.now().saturating_add(elapsed_ms);
        let mut executed = 0;
        while let Some(fired) = self.timers.pop_due(until) {
            if self.run_step(fired.action) {
                executed += 1;
            }
        }
        self.timers.advance_to(until);
        executed
    }

    /// 执行全部剩余步骤直到会话结束
    pub fn run_to_completion(&mut self) -> usize {
        let mut executed = 0;
        while let Some(fired) = self.timers.pop_due(u64::MAX) {
            if self.run_step(fired.action) {
                executed += 1;
            }
        }
        executed
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// 当前会话的完整文本（没有会话时为空）
    pub fn source_text(&self) -> &str {
        self.session.as_ref().map_or("", |s| s.source_text.as_str())
    }

    pub fn cursor(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.cursor)
    }

    pub fn state(&self) -> AnimatorState {
        if self.timers.live_len() > 0 {
            AnimatorState::Typing
        } else {
            AnimatorState::Idle
        }
    }

    pub fn is_typing(&self) -> bool {
        self.state() == AnimatorState::Typing
    }

    /// 当前会话已提交到缓冲区的源字符数（每个字符恰好一次）
    pub fn revealed_steps(&self) -> usize {
        self.revealed_steps
    }

    pub fn next_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    /// 被取消后仍到期的定时器数量；它们不会改动缓冲区
    pub fn stale_fired(&self) -> usize {
        self.timers.stale_fired()
    }

    fn reset(&mut self) {
        let cancelled = self.timers.cancel_all();
        if cancelled > 0 {
            tracing::debug!("取消打字会话 #{} 的 {} 个定时器", self.generation, cancelled);
        }
        self.generation += 1;
        self.session = None;
        self.display.clear();
        self.revealed_steps = 0;
    }

    fn next_delay(&mut self) -> u64 {
        let jitter = self.rng.gen_range(0..=self.config.delay_jitter_ms);
        self.config.base_delay_ms.saturating_add(jitter)
    }

    fn schedule(&mut self, delay_ms: u64, kind: StepKind) {
        let step = Step {
            generation: self.generation,
            kind,
        };
        self.timers.schedule(delay_ms, step);
    }

    /// 执行一个到期步骤；不属于当前会话的步骤为空操作
    fn run_step(&mut self, step: Step) -> bool {
        let current = self.session.as_ref().map(|s| s.generation);
        if current != Some(step.generation) {
            tracing::trace!("忽略过期会话 #{} 的步骤", step.generation);
            return false;
        }
        match step.kind {
            StepKind::TypeNext => self.type_next(),
            StepKind::Backspace { correct, delay_ms } => {
                self.display.pop();
                self.schedule(
                    self.config.typo_correction_delay_ms,
                    StepKind::Correct { correct, delay_ms },
                );
            }
            StepKind::Correct { correct, delay_ms } => {
                self.commit(correct, delay_ms);
            }
        }
        true
    }

    fn type_next(&mut self) {
        let Some(c) = self
            .session
            .as_ref()
            .and_then(|s| s.source.get(s.cursor).copied())
        else {
            return;
        };

        let delay = self.next_delay();
        if c == '\n' {
            self.commit(c, delay.saturating_mul(2));
        } else if self.rng.gen::<f64>() < self.config.typo_probability() {
            let wrong = self.wrong_char_for(c);
            self.display.push(wrong);
            self.schedule(
                delay,
                StepKind::Backspace {
                    correct: c,
                    delay_ms: delay,
                },
            );
        } else {
            self.commit(c, delay);
        }
    }

    /// 写入正确字符、推进游标；还有剩余字符时才安排下一步
    fn commit(&mut self, c: char, next_delay_ms: u64) {
        self.display.push(c);
        self.revealed_steps += 1;
        let finished = match self.session.as_mut() {
            Some(session) => {
                session.cursor += 1;
                session.cursor >= session.source.len()
            }
            None => true,
        };
        if finished {
            tracing::debug!("打字会话 #{} 完成", self.generation);
        } else {
            self.schedule(next_delay_ms, StepKind::TypeNext);
        }
    }

    fn wrong_char_for(&mut self, c: char) -> char {
        loop {
            let idx = self.rng.gen_range(0..TYPO_ALPHABET.len());
            let wrong = char::from(TYPO_ALPHABET[idx]);
            if wrong != c {
                return wrong;
            }
        }
    }
}
