use candle_core::Device;

pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            tracing::info!("inference device: Metal (MPS)");
            return dev;
        }
    }
    tracing::debug!("inference device: CPU");
    Device::Cpu
}
