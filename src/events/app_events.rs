pub enum AppEvent {
    Ready,
    ItemClick,
    Destroyed,
}

impl Into<&'static str> for AppEvent {
    fn into(self) -> &'static str {
        match self {
            AppEvent::Ready => "ready",
            AppEvent::ItemClick => "item:click",
            AppEvent::Destroyed => "destroyed",
        }
    }
}
