use crate::models::TrainRecord;

/// Which train is displayed, always drawn from the latest applied train list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    trains: Vec<TrainRecord>,
    selected: Option<TrainRecord>,
}

impl SelectionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the first successful fetch and select its first train, if any
    pub fn initialize(&mut self, trains: Vec<TrainRecord>) {
        self.selected = trains.first().cloned();
        self.trains = trains;
    }

    /// Replace the train list wholesale after a later fetch
    ///
    /// The selection follows its id into the new list. If that train is gone
    /// the first train of the new list is selected instead.
    pub fn replace(&mut self, trains: Vec<TrainRecord>) {
        let previous_id = self.selected.as_ref().map(|train| train.id.clone());
        self.trains = trains;
        self.selected = previous_id
            .and_then(|id| self.find(&id).cloned())
            .or_else(|| self.trains.first().cloned());
    }

    /// Select the train with exactly this id
    ///
    /// Returns `false` and leaves the selection untouched if no train matches.
    pub fn select(&mut self, train_id: &str) -> bool {
        match self.find(train_id) {
            Some(train) => {
                self.selected = Some(train.clone());
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn find(&self, train_id: &str) -> Option<&TrainRecord> {
        self.trains.iter().find(|train| train.id == train_id)
    }

    #[must_use]
    pub fn trains(&self) -> &[TrainRecord] {
        &self.trains
    }

    #[must_use]
    pub fn selected(&self) -> Option<&TrainRecord> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn is_selected(&self, train_id: &str) -> bool {
        self.selected.as_ref().is_some_and(|train| train.id == train_id)
    }
}
