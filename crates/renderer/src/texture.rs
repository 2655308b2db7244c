//! GPU upload of decoded textures plus the sampler/bind group they are drawn with.

use asset::texture::{TextureData, TextureFormat as CpuFormat};
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, Device,
    Extent3d, FilterMode, Origin3d, Queue, Sampler, SamplerBindingType, SamplerDescriptor,
    ShaderStages, TexelCopyBufferLayout, TexelCopyTextureInfo, Texture, TextureAspect,
    TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType, TextureUsages,
    TextureView, TextureViewDescriptor, TextureViewDimension,
};

/// A 2D texture resident on the GPU, with its view and sampler.
pub struct GpuTexture {
    #[allow(dead_code)]
    texture: Texture,
    view: TextureView,
    sampler: Sampler,
}

impl GpuTexture {
    /// Map CPU pixel layout to the GPU format (colour data is sRGB).
    pub fn gpu_format(format: CpuFormat) -> TextureFormat {
        match format {
            CpuFormat::Rgba8 => TextureFormat::Rgba8UnormSrgb,
        }
    }

    /// Sampler parameters: repeat wrapping, nearest filtering.
    pub fn sampler_descriptor() -> SamplerDescriptor<'static> {
        SamplerDescriptor {
            label: Some("Model Sampler"),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            ..Default::default()
        }
    }

    /// Create the texture object and upload `data` into it.
    pub fn upload(
        device: &Device,
        queue: &Queue,
        data: &TextureData,
        label: &str,
    ) -> anyhow::Result<Self> {
        if !data.is_valid() {
            anyhow::bail!(
                "Texture '{}' has {} bytes for {}x{}, expected tightly packed RGBA8",
                label,
                data.data.len(),
                data.width,
                data.height
            );
        }
        let size = Extent3d {
            width: data.width.max(1),
            height: data.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: Self::gpu_format(data.format),
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            &data.data,
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(data.bytes_per_row()),
                rows_per_image: Some(data.height),
            },
            size,
        );

        let view = texture.create_view(&TextureViewDescriptor::default());
        let sampler = device.create_sampler(&Self::sampler_descriptor());

        log::info!("Uploaded texture '{}' ({}x{})", label, data.width, data.height);

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    /// Bind group layout: binding 0 = texture, binding 1 = sampler.
    pub fn bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Texture BGL"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    pub fn bind_group(&self, device: &Device, layout: &BindGroupLayout) -> BindGroup {
        device.create_bind_group(&BindGroupDescriptor {
            label: Some("Texture BG"),
            layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(&self.view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_uploads_as_srgb() {
        assert_eq!(
            GpuTexture::gpu_format(CpuFormat::Rgba8),
            TextureFormat::Rgba8UnormSrgb
        );
    }

    #[test]
    fn sampler_repeats_with_nearest_filtering() {
        let desc = GpuTexture::sampler_descriptor();
        assert_eq!(desc.address_mode_u, AddressMode::Repeat);
        assert_eq!(desc.address_mode_v, AddressMode::Repeat);
        assert_eq!(desc.mag_filter, FilterMode::Nearest);
        assert_eq!(desc.min_filter, FilterMode::Nearest);
    }
}
