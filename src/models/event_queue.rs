use std::collections::{HashMap, VecDeque};
use std::fmt;

/// エンティティに登録できるイベント種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// 弾の発射に成功した直後
    AfterShot,
    /// 自分の弾が敵を撃破した直後
    AfterKill,
}

/// 一度だけ呼び出されるコールバック
pub type Callback<T> = Box<dyn FnOnce(&mut T)>;

/// エンティティ単位の種別付きワンショットコールバックキュー
///
/// 種別ごとにFIFOで保持し、`pick` で先頭を1件取り出します。
/// 永続的な状態を持たせずに「次の1回だけ」の処理を登録するために使います。
pub struct EventQueue<T> {
    pending: HashMap<EventType, VecDeque<Callback<T>>>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// コールバックを末尾に登録
    pub fn register(&mut self, event: EventType, callback: Callback<T>) {
        self.pending.entry(event).or_default().push_back(callback);
    }

    /// 指定種別の先頭コールバックを取り出す
    ///
    /// 該当がない場合はNoneを返し、キューは変更しない。
    pub fn pick(&mut self, event: EventType) -> Option<Callback<T>> {
        let queue = self.pending.get_mut(&event)?;
        let callback = queue.pop_front();
        if queue.is_empty() {
            self.pending.remove(&event);
        }
        callback
    }

    /// 指定種別の待機中コールバック数
    pub fn pending(&self, event: EventType) -> usize {
        self.pending.get(&event).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&EventType, usize> =
            self.pending.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("EventQueue").field("pending", &counts).finish()
    }
}
