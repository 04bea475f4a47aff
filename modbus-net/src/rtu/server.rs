// Crate
use crate::Handler;
use crate::rtu::Config;

// Workspace
use modbus_mem::DeviceMap;

// External
use anyhow::anyhow;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_modbus::server::rtu::Server as RtuServer;
use tokio_serial::{DataBits, Parity, SerialPortBuilder, SerialStream, StopBits};

fn builder(config: &Config) -> Result<SerialPortBuilder, anyhow::Error> {
    let mut builder = tokio_serial::new(&config.path, config.baud_rate);
    if let Some(v) = config.data_bits {
        builder = builder.data_bits(match v {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            _ => return Err(anyhow!("Invalid data bits specified ({})", v)),
        });
    }
    if let Some(v) = config.stop_bits {
        builder = builder.stop_bits(match v {
            1 => StopBits::One,
            2 => StopBits::Two,
            _ => return Err(anyhow!("Invalid stop bits specified ({})", v)),
        });
    }
    if let Some(ref v) = config.parity {
        builder = builder.parity(match v.to_lowercase().as_str() {
            "odd" => Parity::Odd,
            "even" => Parity::Even,
            "none" => Parity::None,
            _ => return Err(anyhow!("Invalid parity specified ({})", v)),
        });
    }
    Ok(builder)
}

/// Open the serial device and serve the device memory on a background task.
pub async fn run<L>(
    config: &Config,
    map: Arc<DeviceMap>,
    log: L,
) -> Result<JoinHandle<Result<(), anyhow::Error>>, anyhow::Error>
where
    L: Fn(String) + Clone + Send + Sync + 'static,
{
    let builder = builder(config)?;
    let serial_stream = SerialStream::open(&builder)
        .map_err(|e| anyhow!("Failed to open serial device {} [{}]", config.path, e))?;
    log(format!(
        "Serving Modbus RTU on {} with {} baud",
        config.path, config.baud_rate
    ));

    let rtu_server = RtuServer::new(serial_stream);
    let handler = Handler::new(map, log);
    Ok(tokio::task::spawn(async move {
        rtu_server
            .serve_forever(handler)
            .await
            .map_err(|e| anyhow!("{}", e))
    }))
}

#[cfg(test)]
mod tests {
    use super::builder;
    use crate::rtu::Config;

    #[test]
    fn ut_rtu_builder() {
        let mut config = Config {
            path: String::from("/dev/ttyUSB0"),
            baud_rate: 9600,
            parity: Some(String::from("Even")),
            data_bits: Some(8),
            stop_bits: Some(1),
        };
        assert!(builder(&config).is_ok());

        config.data_bits = Some(9);
        assert!(builder(&config).is_err());

        config.data_bits = None;
        config.parity = Some(String::from("mark"));
        assert!(builder(&config).is_err());

        config.parity = None;
        config.stop_bits = Some(3);
        assert!(builder(&config).is_err());
    }
}
