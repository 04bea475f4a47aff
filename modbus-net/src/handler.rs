// Workspace
use modbus_mem::{DeviceMap, Discrete, Error, Register};

// External
use std::future;
use std::sync::Arc;
use tokio_modbus::prelude::{ExceptionCode, Response, SlaveRequest};
use tokio_modbus::{Request, SlaveId};

/// Quantity limits of the Modbus application protocol.
const MAX_READ_BITS: usize = 0x07D0;
const MAX_READ_WORDS: usize = 0x007D;
const MAX_WRITE_BITS: usize = 0x07B0;
const MAX_WRITE_WORDS: usize = 0x007B;
const MAX_READ_WRITE_WORDS: usize = 0x0079;

/// Map an error of the device memory to the exception reported to the master.
pub fn exception(e: &Error) -> ExceptionCode {
    match e {
        Error::AddressOutOfRange { .. } | Error::ReadOnly(_) => ExceptionCode::IllegalDataAddress,
        Error::Observer(_) => ExceptionCode::ServerDeviceFailure,
    }
}

fn quantity(cnt: usize, max: usize) -> Result<(), ExceptionCode> {
    if (1..=max).contains(&cnt) {
        Ok(())
    } else {
        Err(ExceptionCode::IllegalDataValue)
    }
}

/// Executes Modbus requests against a shared [`DeviceMap`].
pub struct Handler<L>
where
    L: Fn(String) + Clone + Send + Sync + 'static,
{
    map: Arc<DeviceMap>,
    log: L,
}

impl<L> Handler<L>
where
    L: Fn(String) + Clone + Send + Sync + 'static,
{
    pub fn new(map: Arc<DeviceMap>, log: L) -> Self {
        Self { map, log }
    }

    fn fail(&self, name: &str, slave: SlaveId, e: Error) -> ExceptionCode {
        let code = exception(&e);
        (self.log)(format!(
            "{} request for slave ID {} failed with {:?}. [{}]",
            name, slave, code, e
        ));
        code
    }

    pub fn handle(
        &self,
        slave: SlaveId,
        request: Request<'static>,
    ) -> Result<Response, ExceptionCode> {
        match request {
            Request::ReadCoils(addr, cnt) => {
                quantity(cnt as usize, MAX_READ_BITS)?;
                self.map
                    .read_from(Discrete::Coil, addr, cnt as usize)
                    .map(Response::ReadCoils)
                    .map_err(|e| self.fail("ReadCoils", slave, e))
            }
            Request::ReadDiscreteInputs(addr, cnt) => {
                quantity(cnt as usize, MAX_READ_BITS)?;
                self.map
                    .read_from(Discrete::Input, addr, cnt as usize)
                    .map(Response::ReadDiscreteInputs)
                    .map_err(|e| self.fail("ReadDiscreteInputs", slave, e))
            }
            Request::ReadHoldingRegisters(addr, cnt) => {
                quantity(cnt as usize, MAX_READ_WORDS)?;
                self.map
                    .read_from(Register::Holding, addr, cnt as usize)
                    .map(Response::ReadHoldingRegisters)
                    .map_err(|e| self.fail("ReadHoldingRegisters", slave, e))
            }
            Request::ReadInputRegisters(addr, cnt) => {
                quantity(cnt as usize, MAX_READ_WORDS)?;
                self.map
                    .read_from(Register::Input, addr, cnt as usize)
                    .map(Response::ReadInputRegisters)
                    .map_err(|e| self.fail("ReadInputRegisters", slave, e))
            }
            Request::WriteSingleCoil(addr, value) => self
                .map
                .write_to(Discrete::Coil, addr, &[value])
                .map(|_| Response::WriteSingleCoil(addr, value))
                .map_err(|e| self.fail("WriteSingleCoil", slave, e)),
            Request::WriteMultipleCoils(addr, values) => {
                quantity(values.len(), MAX_WRITE_BITS)?;
                self.map
                    .write_to(Discrete::Coil, addr, &values[..])
                    .map(|_| Response::WriteMultipleCoils(addr, values.len() as u16))
                    .map_err(|e| self.fail("WriteMultipleCoils", slave, e))
            }
            Request::WriteSingleRegister(addr, value) => self
                .map
                .write_to(Register::Holding, addr, &[value])
                .map(|_| Response::WriteSingleRegister(addr, value))
                .map_err(|e| self.fail("WriteSingleRegister", slave, e)),
            Request::WriteMultipleRegisters(addr, values) => {
                quantity(values.len(), MAX_WRITE_WORDS)?;
                self.map
                    .write_to(Register::Holding, addr, &values[..])
                    .map(|_| Response::WriteMultipleRegisters(addr, values.len() as u16))
                    .map_err(|e| self.fail("WriteMultipleRegisters", slave, e))
            }
            Request::MaskWriteRegister(addr, and_mask, or_mask) => self
                .map
                .modify(Register::Holding, addr, |current| {
                    (current & and_mask) | (or_mask & !and_mask)
                })
                .map(|_| Response::MaskWriteRegister(addr, and_mask, or_mask))
                .map_err(|e| self.fail("MaskWriteRegister", slave, e)),
            Request::ReadWriteMultipleRegisters(read_addr, cnt, write_addr, values) => {
                quantity(cnt as usize, MAX_READ_WORDS)?;
                quantity(values.len(), MAX_READ_WRITE_WORDS)?;
                self.map
                    .write_read(
                        Register::Holding,
                        write_addr,
                        &values[..],
                        read_addr,
                        cnt as usize,
                    )
                    .map(Response::ReadWriteMultipleRegisters)
                    .map_err(|e| self.fail("ReadWriteMultipleRegisters", slave, e))
            }
            request => {
                (self.log)(format!(
                    "Unsupported request {:?} received for slave ID {}.",
                    request, slave
                ));
                Err(ExceptionCode::IllegalFunction)
            }
        }
    }
}

impl<L> Clone for Handler<L>
where
    L: Fn(String) + Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            log: self.log.clone(),
        }
    }
}

impl<L> tokio_modbus::server::Service for Handler<L>
where
    L: Fn(String) + Clone + Send + Sync + 'static,
{
    type Request = SlaveRequest<'static>;
    type Exception = ExceptionCode;
    type Response = Response;
    type Future = future::Ready<Result<Response, ExceptionCode>>;

    fn call(&self, request: Self::Request) -> Self::Future {
        let SlaveRequest { slave, request } = request;
        future::ready(self.handle(slave, request))
    }
}

#[cfg(test)]
mod tests {
    use super::{Handler, exception};
    use modbus_mem::{BankKind, DeviceMap, Discrete, Error, Layout, Register, WritePolicy};
    use std::borrow::Cow;
    use std::sync::{Arc, Mutex};
    use tokio_modbus::Request;
    use tokio_modbus::prelude::{ExceptionCode, Response, SlaveRequest};
    use tokio_modbus::server::Service;

    fn handler(
        layout: Layout,
    ) -> (
        Handler<impl Fn(String) + Clone + Send + Sync + 'static>,
        Arc<DeviceMap>,
    ) {
        let map = Arc::new(DeviceMap::new(&layout));
        (Handler::new(map.clone(), |_| {}), map)
    }

    #[test]
    fn ut_exception() {
        let e = Error::AddressOutOfRange {
            kind: BankKind::Coil,
            start: 1,
            end: 3,
            size: 2,
        };
        assert_eq!(exception(&e), ExceptionCode::IllegalDataAddress);
        assert_eq!(
            exception(&Error::ReadOnly(BankKind::Input)),
            ExceptionCode::IllegalDataAddress
        );
        assert_eq!(
            exception(&Error::Observer(anyhow::anyhow!("broken"))),
            ExceptionCode::ServerDeviceFailure
        );
    }

    #[test]
    fn ut_handler_registers() {
        let (handler, map) = handler(Layout::uniform(10));
        map.populate(Register::Input, 2, &[0x1234]).unwrap();

        assert_eq!(
            handler.handle(1, Request::WriteSingleRegister(0, 42)),
            Ok(Response::WriteSingleRegister(0, 42))
        );
        assert_eq!(
            handler.handle(1, Request::ReadHoldingRegisters(0, 1)),
            Ok(Response::ReadHoldingRegisters(vec![42]))
        );
        assert_eq!(
            handler.handle(1, Request::ReadHoldingRegisters(9, 2)),
            Err(ExceptionCode::IllegalDataAddress)
        );
        assert_eq!(
            handler.handle(1, Request::ReadHoldingRegisters(9, 1)),
            Ok(Response::ReadHoldingRegisters(vec![0]))
        );
        assert_eq!(
            handler.handle(1, Request::WriteMultipleRegisters(4, Cow::Owned(vec![1, 2, 3]))),
            Ok(Response::WriteMultipleRegisters(4, 3))
        );
        assert_eq!(
            handler.handle(1, Request::ReadInputRegisters(1, 3)),
            Ok(Response::ReadInputRegisters(vec![0, 0x1234, 0]))
        );
        assert_eq!(&map.snapshot(Register::Holding)[4..7], &[1, 2, 3]);
    }

    #[test]
    fn ut_handler_coils() {
        let (handler, map) = handler(Layout::uniform(8));
        map.populate(Discrete::Input, 0, &[true, true]).unwrap();

        assert_eq!(
            handler.handle(1, Request::WriteSingleCoil(7, true)),
            Ok(Response::WriteSingleCoil(7, true))
        );
        assert_eq!(
            handler.handle(1, Request::WriteMultipleCoils(0, Cow::Owned(vec![true, false, true]))),
            Ok(Response::WriteMultipleCoils(0, 3))
        );
        assert_eq!(
            handler.handle(1, Request::ReadCoils(0, 8)),
            Ok(Response::ReadCoils(vec![
                true, false, true, false, false, false, false, true
            ]))
        );
        assert_eq!(
            handler.handle(1, Request::ReadDiscreteInputs(1, 2)),
            Ok(Response::ReadDiscreteInputs(vec![true, false]))
        );
        assert_eq!(
            handler.handle(1, Request::WriteSingleCoil(8, true)),
            Err(ExceptionCode::IllegalDataAddress)
        );
    }

    #[test]
    fn ut_handler_quantity() {
        let (handler, _) = handler(Layout::uniform(4096));
        assert_eq!(
            handler.handle(1, Request::ReadCoils(0, 0)),
            Err(ExceptionCode::IllegalDataValue)
        );
        assert_eq!(
            handler.handle(1, Request::ReadHoldingRegisters(0, 126)),
            Err(ExceptionCode::IllegalDataValue)
        );
        assert!(handler.handle(1, Request::ReadHoldingRegisters(0, 125)).is_ok());
        assert!(handler.handle(1, Request::ReadDiscreteInputs(0, 2000)).is_ok());
        assert_eq!(
            handler.handle(1, Request::WriteMultipleRegisters(0, Cow::Owned(vec![0; 124]))),
            Err(ExceptionCode::IllegalDataValue)
        );
    }

    #[test]
    fn ut_handler_mask_write() {
        let (handler, map) = handler(Layout::uniform(2));
        map.populate(Register::Holding, 1, &[0x0012]).unwrap();
        assert_eq!(
            handler.handle(1, Request::MaskWriteRegister(1, 0x00F2, 0x0025)),
            Ok(Response::MaskWriteRegister(1, 0x00F2, 0x0025))
        );
        assert_eq!(map.snapshot(Register::Holding), vec![0, 0x0017]);

        assert_eq!(
            handler.handle(1, Request::MaskWriteRegister(2, 0xFFFF, 0)),
            Err(ExceptionCode::IllegalDataAddress)
        );
    }

    #[test]
    fn ut_handler_mask_write_single_access() {
        let (handler, map) = handler(Layout::uniform(1));
        // Any read access would open a window for a competing writer
        map.on_read().register(|map, _| {
            map.write_to(Register::Holding, 0, &[0x0100])?;
            Ok(())
        });
        assert!(
            handler
                .handle(1, Request::MaskWriteRegister(0, 0xFFFE, 0x0001))
                .is_ok()
        );
        assert_eq!(map.snapshot(Register::Holding), vec![0x0001]);
    }

    #[test]
    fn ut_handler_mask_write_concurrent() {
        let (handler, map) = handler(Layout::uniform(1));
        let handler = &handler;
        std::thread::scope(|s| {
            for bit in 0..16u16 {
                s.spawn(move || {
                    let mask = 1u16 << bit;
                    for _ in 0..50 {
                        handler
                            .handle(1, Request::MaskWriteRegister(0, !mask, 0))
                            .unwrap();
                        handler
                            .handle(1, Request::MaskWriteRegister(0, !mask, mask))
                            .unwrap();
                    }
                });
            }
        });
        assert_eq!(map.snapshot(Register::Holding), vec![0xFFFF]);
    }

    #[test]
    fn ut_handler_read_write() {
        let (handler, _) = handler(Layout::uniform(4));
        assert_eq!(
            handler.handle(
                1,
                Request::ReadWriteMultipleRegisters(0, 4, 1, Cow::Owned(vec![5, 6]))
            ),
            Ok(Response::ReadWriteMultipleRegisters(vec![0, 5, 6, 0]))
        );
    }

    #[test]
    fn ut_handler_read_write_invalid_read() {
        let (handler, map) = handler(Layout::uniform(4));
        assert_eq!(
            handler.handle(
                1,
                Request::ReadWriteMultipleRegisters(3, 5, 0, Cow::Owned(vec![7, 7]))
            ),
            Err(ExceptionCode::IllegalDataAddress)
        );
        assert_eq!(map.snapshot(Register::Holding), vec![0, 0, 0, 0]);
    }

    #[test]
    fn ut_handler_unsupported() {
        let log = Arc::new(Mutex::new(vec![]));
        let map = Arc::new(DeviceMap::new(&Layout::uniform(2)));
        let handler = {
            let log = log.clone();
            Handler::new(map, move |s| log.lock().unwrap().push(s))
        };
        assert_eq!(
            handler.handle(1, Request::ReportServerId),
            Err(ExceptionCode::IllegalFunction)
        );
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn ut_handler_strict_policy() {
        let map = Arc::new(DeviceMap::new(&Layout::uniform(2)).with_policy(WritePolicy::Strict));
        let handler = Handler::new(map.clone(), |_| {});
        assert_eq!(
            handler.handle(1, Request::WriteSingleRegister(0, 1)),
            Ok(Response::WriteSingleRegister(0, 1))
        );
        assert!(map.write_to(Register::Input, 0, &[1]).is_err());
    }

    #[test]
    fn ut_handler_service() {
        let (handler, _) = handler(Layout::uniform(2));
        let response = handler
            .call(SlaveRequest {
                slave: 1,
                request: Request::ReadCoils(0, 2),
            })
            .into_inner();
        assert_eq!(response, Ok(Response::ReadCoils(vec![false, false])));
    }
}
