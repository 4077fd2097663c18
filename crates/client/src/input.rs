use anyhow::{Result, bail};

use cs2d::PlayerInput;

/// Keys held for the whole run, e.g. `--input up,shoot`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub shoot: bool,
}

impl InputState {
    pub fn parse(keys: &str) -> Result<Self> {
        let mut state = Self::default();

        for key in keys.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            match key.to_ascii_lowercase().as_str() {
                "up" | "w" => state.up = true,
                "down" | "s" => state.down = true,
                "left" | "a" => state.left = true,
                "right" | "d" => state.right = true,
                "shoot" | "fire" | "space" => state.shoot = true,
                other => bail!("unknown input key '{}'", other),
            }
        }

        Ok(state)
    }

    pub fn to_input(&self) -> PlayerInput {
        PlayerInput::from_keys(self.up, self.down, self.left, self.right, self.shoot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys() {
        let state = InputState::parse("up, D,shoot").unwrap();

        assert!(state.up);
        assert!(state.right);
        assert!(state.shoot);
        assert!(!state.down);
        assert!(!state.left);
        assert_eq!(
            state.to_input(),
            PlayerInput::UP | PlayerInput::RIGHT | PlayerInput::SHOOT
        );
    }

    #[test]
    fn test_empty_is_idle() {
        assert_eq!(InputState::parse("").unwrap().to_input(), PlayerInput::empty());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(InputState::parse("up,jump").is_err());
    }
}
