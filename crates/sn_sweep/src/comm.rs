// crates/sn_sweep/src/comm.rs

//! 分区间通信层
//!
//! 每个分区一个线程，分区间用 [`std::sync::mpsc`] 通道传递
//! [`FluxMessage`]。每个分区持有唯一接收端，其余分区各持有一个
//! 克隆的发送端；通道保证同一发送方的消息按发送顺序到达，满足
//! 调度器对接收顺序的唯一要求。
//!
//! # 设计原则
//!
//! - 发送永不阻塞（无界通道），流水线调度靠消息缓冲自然解耦
//! - 接收区分非阻塞轮询与带超时阻塞两种，由调度策略选择
//! - 遍间同步用可中止的计数屏障，保证反射存储换遍时所有分区都
//!   已完成本遍；任一分区出错时屏障被中止，等待者以错误返回

use crate::message::FluxMessage;
use sn_foundation::error::{SnError, SnResult};
use sn_foundation::indices::RankIndex;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

// ============================================================
// 可中止的遍末屏障
// ============================================================

#[derive(Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    poisoned: bool,
}

/// 计数会合点，与 [`std::sync::Barrier`] 的区别在于可以中止：
/// 某个分区在到达屏障前出错时调用 [`PassBarrier::poison`]，已在
/// 等待的分区立刻以 `Communication` 错误醒来，而不是永远等一个
/// 不会到来的参与者。
struct PassBarrier {
    state: Mutex<BarrierState>,
    cvar: Condvar,
    n: usize,
}

impl PassBarrier {
    fn new(n: usize) -> Self {
        Self {
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
            n,
        }
    }

    fn wait(&self) -> SnResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SnError::internal("遍末屏障锁中毒"))?;
        if state.poisoned {
            return Err(SnError::communication("遍末屏障已被其他分区中止"));
        }
        state.arrived += 1;
        if state.arrived == self.n {
            state.arrived = 0;
            state.generation += 1;
            self.cvar.notify_all();
            return Ok(());
        }
        let generation = state.generation;
        while state.generation == generation && !state.poisoned {
            state = self
                .cvar
                .wait(state)
                .map_err(|_| SnError::internal("遍末屏障锁中毒"))?;
        }
        if state.poisoned {
            Err(SnError::communication("遍末屏障已被其他分区中止"))
        } else {
            Ok(())
        }
    }

    fn poison(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.poisoned = true;
            state.arrived = 0;
            self.cvar.notify_all();
        }
    }

    fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.poisoned = false;
            state.arrived = 0;
        }
    }
}

/// 带来源标记的在途消息
pub type Envelope = (RankIndex, FluxMessage);

/// 单个分区的通信端点
///
/// 由 [`SweepComm::for_ranks`] 成组创建，每个端点移交给对应的
/// 分区线程独占使用。
pub struct RankComm {
    rank: RankIndex,
    rx: Receiver<Envelope>,
    peers: Vec<Option<Sender<Envelope>>>,
    barrier: Arc<PassBarrier>,
}

/// 通信端点工厂
pub struct SweepComm;

impl SweepComm {
    /// 为 `n_ranks` 个分区创建互联的通信端点
    pub fn for_ranks(n_ranks: usize) -> SnResult<Vec<RankComm>> {
        if n_ranks == 0 {
            return Err(SnError::invalid_input("分区数必须大于 0"));
        }
        let mut senders = Vec::with_capacity(n_ranks);
        let mut receivers = Vec::with_capacity(n_ranks);
        for _ in 0..n_ranks {
            let (tx, rx) = channel();
            senders.push(tx);
            receivers.push(rx);
        }
        let barrier = Arc::new(PassBarrier::new(n_ranks));

        Ok(receivers
            .into_iter()
            .enumerate()
            .map(|(r, rx)| RankComm {
                rank: RankIndex::new(r),
                rx,
                peers: senders
                    .iter()
                    .enumerate()
                    .map(|(p, tx)| (p != r).then(|| tx.clone()))
                    .collect(),
                barrier: Arc::clone(&barrier),
            })
            .collect())
    }
}

impl RankComm {
    /// 本端点所属分区
    #[inline]
    pub fn rank(&self) -> RankIndex {
        self.rank
    }

    /// 分区总数
    #[inline]
    pub fn n_ranks(&self) -> usize {
        self.peers.len()
    }

    /// 向目标分区发送消息（非阻塞）
    pub fn send(&self, to: RankIndex, msg: FluxMessage) -> SnResult<()> {
        let tx = self
            .peers
            .get(to.get())
            .and_then(Option::as_ref)
            .ok_or_else(|| {
                SnError::communication(format!("分区 {} 没有到分区 {} 的通道", self.rank, to))
            })?;
        tx.send((self.rank, msg))?;
        Ok(())
    }

    /// 非阻塞轮询一条在途消息
    pub fn try_recv(&self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    /// 带超时阻塞接收
    ///
    /// 超时或对端全部断开 → `Communication`。
    pub fn recv_timeout(&self, timeout: Duration) -> SnResult<Envelope> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => SnError::communication(format!(
                "分区 {} 等待通量消息超时（{:?}）",
                self.rank, timeout
            )),
            RecvTimeoutError::Disconnected => {
                SnError::communication(format!("分区 {} 的接收通道已断开", self.rank))
            }
        })
    }

    /// 清空接收队列，返回丢弃的消息数（扫描中止时调用）
    pub fn drain(&self) -> usize {
        let mut n = 0;
        while self.rx.try_recv().is_ok() {
            n += 1;
        }
        n
    }

    /// 遍末屏障：等待所有分区完成本遍
    ///
    /// 任一分区调用过 [`Self::abort_pass`] 时以 `Communication`
    /// 错误返回，包括已经停在屏障上的等待者。
    pub fn wait_pass(&self) -> SnResult<()> {
        self.barrier.wait()
    }

    /// 中止遍末屏障，唤醒所有等待中的分区并让其出错返回
    pub fn abort_pass(&self) {
        self.barrier.poison();
    }

    /// 恢复遍末屏障；所有分区都完成中止清理后才能安全调用
    pub fn reset_pass(&self) {
        self.barrier.reset();
    }
}
