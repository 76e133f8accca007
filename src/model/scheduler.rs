//! 虚拟时钟定时器队列：单线程协作式调度，动画与通知共用
//!
//! 时间单位为毫秒。队列本身不睡眠，由宿主（UI 定时器或测试）推进时钟。

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

/// 定时器令牌，取消时使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// 已到期并弹出的定时任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<A> {
    pub id: TimerId,
    pub due: u64,
    pub action: A,
}

#[derive(Debug)]
struct Entry<A> {
    due: u64,
    id: TimerId,
    action: A,
}

// 堆内只按 (due, id) 排序；id 单调递增，保证同一时刻按调度顺序触发
impl<A> PartialEq for Entry<A> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl<A> Eq for Entry<A> {}

impl<A> PartialOrd for Entry<A> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Entry<A> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due, self.id).cmp(&(other.due, other.id))
    }
}

#[derive(Debug)]
pub struct TimerQueue<A> {
    now: u64,
    next_id: u64,
    heap: BinaryHeap<Reverse<Entry<A>>>,
    cancelled: HashSet<TimerId>,
    stale_fired: usize,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self {
            now: 0,
            next_id: 0,
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            stale_fired: 0,
        }
    }
}

impl<A> TimerQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前虚拟时间
    pub fn now(&self) -> u64 {
        self.now
    }

    /// 在 now + delay 时刻触发 action
    pub fn schedule(&mut self, delay_ms: u64, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Entry {
            due: self.now.saturating_add(delay_ms),
            id,
            action,
        }));
        id
    }

    /// 取消单个定时器；条目留在堆中，到期时作为过期触发被跳过
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let pending = self.heap.iter().any(|Reverse(e)| e.id == id);
        pending && self.cancelled.insert(id)
    }

    /// 取消所有尚未触发的定时器，返回本次新取消的数量
    pub fn cancel_all(&mut self) -> usize {
        let ids: Vec<TimerId> = self.heap.iter().map(|Reverse(e)| e.id).collect();
        ids.into_iter().filter(|id| self.cancelled.insert(*id)).count()
    }

    /// 弹出下一个 due <= until 的有效任务，并把时钟推进到其到期时刻
    pub fn pop_due(&mut self, until: u64) -> Option<Fired<A>> {
        loop {
            let due = self.heap.peek().map(|Reverse(e)| e.due)?;
            if due > until {
                return None;
            }
            let Reverse(entry) = self.heap.pop()?;
            self.now = self.now.max(entry.due);
            if self.cancelled.remove(&entry.id) {
                self.stale_fired += 1;
                tracing::trace!("跳过已取消的定时器 {:?}", entry.id);
                continue;
            }
            return Some(Fired {
                id: entry.id,
                due: entry.due,
                action: entry.action,
            });
        }
    }

    /// 所有到期任务处理完毕后，把时钟推进到 until
    pub fn advance_to(&mut self, until: u64) {
        self.now = self.now.max(until);
    }

    /// 下一个有效任务的到期时间
    pub fn next_due(&self) -> Option<u64> {
        self.heap
            .iter()
            .filter(|Reverse(e)| !self.cancelled.contains(&e.id))
            .map(|Reverse(e)| e.due)
            .min()
    }

    /// 尚未触发且未取消的任务数
    pub fn live_len(&self) -> usize {
        self.heap.len() - self.cancelled.len()
    }

    /// 已取消但仍到期“触发”的次数（均为空操作）
    pub fn stale_fired(&self) -> usize {
        self.stale_fired
    }
}
