//! Example: Logical data access and dark/flat frames from an interleaved scan
//!
//! Run with: cargo run --example embedded_view

use darkflat::{
    AxisDescriptor, DarkFlatView, Dataset, DatasetLayout, FrameLabel, ImageKey, SliceSpec,
    ViewConfig,
};
use ndarray::{Array, IxDyn};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("darkflat Example: Embedded View");
    println!("===============================\n");

    // 2 darks, 3 flats, 20 projections, 3 flats
    let mut labels = vec![FrameLabel::Dark; 2];
    labels.extend([FrameLabel::Flat; 3]);
    labels.extend([FrameLabel::Data; 20]);
    labels.extend([FrameLabel::Flat; 3]);
    let image_key = ImageKey::new(labels);
    let frames = image_key.len();

    let layout = DatasetLayout::new(vec![
        AxisDescriptor::new(frames, "rotation_angle", "degrees"),
        AxisDescriptor::new(64, "detector_y", "pixel"),
        AxisDescriptor::new(96, "detector_x", "pixel"),
    ])?;
    println!("Layout: {}", layout.summary());

    // Darks sit near 100 counts, flats near 4000, projections in between
    let data = Array::from_shape_fn(IxDyn(&[frames, 64, 96]), |ix| {
        match image_key.labels()[ix[0]] {
            FrameLabel::Dark => 100 + (ix[2] % 3) as u16,
            FrameLabel::Flat => 4000 + ix[0] as u16,
            _ => 1500 + ix[1] as u16,
        }
    });
    let dataset = Arc::new(Dataset::new(layout, data)?);

    let config = ViewConfig::new().with_scales(1.0, 1.0);
    let mut view = DarkFlatView::embedded(dataset, image_key, 0, &config)?;
    println!("Physical shape: {:?}", view.dataset().shape());
    println!("Logical shape:  {:?}", view.shape());
    println!();

    view.set_dark_and_flat()?;
    println!("Calibration slice list: {:?}", view.dark_flat_slice_list()?);

    let flat = view.flat()?;
    let dark = view.dark()?;
    println!("Flat: shape {:?}, mean {:.1}", flat.shape(), flat.mean().unwrap_or(0.0));
    println!("Dark: shape {:?}, mean {:.1}", dark.shape(), dark.mean().unwrap_or(0.0));

    // Logical frame 0 is the first projection, not the first dark
    let projection = view.get(&[SliceSpec::Index(0)])?;
    let corrected = (projection.mapv(f32::from) - &dark) / (&flat - &dark);
    println!(
        "Corrected projection 0: shape {:?}, mean {:.3}",
        corrected.shape(),
        corrected.mean().unwrap_or(0.0)
    );

    let meta = view.dataset().meta_data();
    println!(
        "Published to metadata: dark={}, flat={}",
        meta.contains("dark"),
        meta.contains("flat")
    );

    Ok(())
}
