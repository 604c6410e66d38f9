use super::{Game, Studio};
use crate::errors::LinkError;

/// Studios visible to the logged-in account, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationTree {
    studios: Vec<Studio>,
}

impl OrganizationTree {
    /// Creates a tree from studios in server order.
    pub fn new(studios: Vec<Studio>) -> Self {
        Self { studios }
    }

    /// Replaces the whole tree. There is no partial update.
    pub fn replace(&mut self, studios: Vec<Studio>) {
        self.studios = studios;
    }

    /// All studios, in server order.
    pub fn studios(&self) -> &[Studio] {
        &self.studios
    }

    /// Finds a studio by id.
    pub fn studio(&self, id: i64) -> Option<&Studio> {
        self.studios.iter().find(|s| s.id == id)
    }

    /// Games of the studio, or an empty slice for an unknown studio.
    pub fn games_of(&self, studio_id: i64) -> &[Game] {
        self.studio(studio_id)
            .map(|s| s.games.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the account has no studios, or nothing has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.studios.is_empty()
    }
}

/// The studio and game picked in the presentation layer.
///
/// A selected game always belongs to the selected studio.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    studio: Option<Studio>,
    game: Option<Game>,
}

impl Selection {
    /// Currently selected studio.
    pub fn studio(&self) -> Option<&Studio> {
        self.studio.as_ref()
    }

    /// Currently selected game, always one of the selected studio's games.
    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// Selects a studio and clears the selected game.
    pub fn select_studio(&mut self, studio: Studio) {
        tracing::info!(studio = %studio.name, "studio selected");
        self.studio = Some(studio);
        self.game = None;
    }

    /// Selects a game of the selected studio.
    pub fn select_game(&mut self, game: Game) -> Result<&Game, LinkError> {
        let studio = self.studio.as_ref().ok_or(LinkError::NoStudioSelected)?;

        if studio.game(game.id) != Some(&game) {
            return Err(LinkError::GameNotInStudio {
                studio: studio.id,
                game: game.id,
            });
        }

        tracing::info!(game = %game.name, "game selected");
        let game = self.game.insert(game);
        Ok(&*game)
    }

    /// Clears both the studio and the game.
    pub fn clear(&mut self) {
        self.studio = None;
        self.game = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(id: i64, name: &str) -> Game {
        Game {
            name: name.to_string(),
            id,
            game_key: format!("key-{}", id),
            secret_key: format!("secret-{}", id),
        }
    }

    fn studio(id: i64, name: &str, games: Vec<Game>) -> Studio {
        Studio {
            name: name.to_string(),
            id,
            games,
        }
    }

    fn tree() -> OrganizationTree {
        OrganizationTree::new(vec![
            studio(1, "Alpha", vec![game(10, "Rocket"), game(11, "Comet")]),
            studio(2, "Beta", vec![game(20, "Puzzle")]),
            studio(3, "Gamma", vec![]),
        ])
    }

    #[test]
    fn games_keep_server_order() {
        let tree = tree();
        let names: Vec<_> = tree.games_of(1).iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Rocket", "Comet"]);
        assert!(tree.games_of(3).is_empty());
        assert!(tree.games_of(99).is_empty());
    }

    #[test]
    fn replace_is_wholesale() {
        let mut tree = tree();
        tree.replace(vec![studio(7, "Delta", vec![])]);
        assert_eq!(tree.studios().len(), 1);
        assert!(tree.studio(1).is_none());
    }

    #[test]
    fn selecting_studio_clears_game() {
        let tree = tree();
        let mut selection = Selection::default();

        // From an empty selection.
        selection.select_studio(tree.studios()[0].clone());
        assert!(selection.game().is_none());

        // From a studio with a game.
        selection.select_game(tree.games_of(1)[1].clone()).unwrap();
        assert_eq!(selection.game().map(|g| g.id), Some(11));
        selection.select_studio(tree.studios()[1].clone());
        assert!(selection.game().is_none());

        // Re-selecting the same studio also clears.
        selection.select_game(tree.games_of(2)[0].clone()).unwrap();
        selection.select_studio(tree.studios()[1].clone());
        assert!(selection.game().is_none());
        assert_eq!(selection.studio().map(|s| s.id), Some(2));

        selection.clear();
        assert_eq!(selection, Selection::default());
    }

    #[test]
    fn game_must_belong_to_selected_studio() {
        let tree = tree();
        let mut selection = Selection::default();

        assert_eq!(
            selection.select_game(game(10, "Rocket")),
            Err(LinkError::NoStudioSelected)
        );

        selection.select_studio(tree.studios()[1].clone());
        assert_eq!(
            selection.select_game(game(10, "Rocket")),
            Err(LinkError::GameNotInStudio { studio: 2, game: 10 })
        );
        assert!(selection.game().is_none());
    }
}
