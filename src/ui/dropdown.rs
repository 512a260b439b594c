use crate::view::DestinationKind;

/// The VK and Telegram list panels. At most one is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dropdowns {
    open: Option<DestinationKind>,
}

impl Dropdowns {
    pub fn toggle(&mut self, kind: DestinationKind) {
        let was_open = self.is_open(kind);
        self.close_all();
        if !was_open {
            self.open = Some(kind);
        }
    }

    pub fn close_all(&mut self) {
        self.open = None;
    }

    pub fn is_open(&self, kind: DestinationKind) -> bool {
        self.open == Some(kind)
    }
}
