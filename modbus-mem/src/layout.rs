use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Number of slots addressable with a 16-bit protocol address.
pub const MAX_USABLE: usize = u16::MAX as usize + 1;

/// Number of protocol addressable slots of each bank.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Layout {
    pub coils: usize,
    pub discrete_inputs: usize,
    pub holding_registers: usize,
    pub input_registers: usize,
}

impl Layout {
    /// Layout with the same number of slots in every bank.
    pub fn uniform(usable: usize) -> Self {
        Self {
            coils: usable,
            discrete_inputs: usable,
            holding_registers: usable,
            input_registers: usable,
        }
    }

    /// Fails if a bank is larger than the protocol can address.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, size) in [
            ("coils", self.coils),
            ("discrete_inputs", self.discrete_inputs),
            ("holding_registers", self.holding_registers),
            ("input_registers", self.input_registers),
        ] {
            if size > MAX_USABLE {
                return Err(anyhow!(
                    "Layout of {} exceeds {} slots ({})",
                    name,
                    MAX_USABLE,
                    size
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Layout, MAX_USABLE};

    #[test]
    fn ut_layout_partial() {
        let layout: Layout = serde_json::from_str(r#"{ "holding_registers": 10 }"#).unwrap();
        assert_eq!(
            layout,
            Layout {
                coils: 0,
                discrete_inputs: 0,
                holding_registers: 10,
                input_registers: 0,
            }
        );
        assert_eq!(Layout::uniform(4).input_registers, 4);
    }

    #[test]
    fn ut_layout_validate() {
        assert!(Layout::uniform(MAX_USABLE).validate().is_ok());
        assert!(Layout::default().validate().is_ok());

        let layout = Layout {
            input_registers: MAX_USABLE + 1,
            ..Layout::default()
        };
        let e = layout.validate().unwrap_err();
        assert_eq!(e.to_string(), "Layout of input_registers exceeds 65536 slots (65537)");

        let layout = Layout {
            coils: usize::MAX,
            ..Layout::default()
        };
        assert!(layout.validate().is_err());
    }
}
