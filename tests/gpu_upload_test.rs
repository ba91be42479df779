#[cfg(feature = "integration-tests")]
mod common;

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_upload_model_with_placeholders() {
    use flow_model::{
        TextureKind, load_model,
        render::GpuModel,
    };

    use crate::common::test_utils::{HUT, find, headless_device, setup};

    setup();
    let (device, queue) = headless_device().await.expect("no GPU adapter available");
    let (model, textures) = load_model(HUT, &device, &queue);

    assert_eq!(model.meshes().len(), 3);
    assert_eq!(textures.len(), 2);

    let roof = find(model.meshes(), "Roof");
    let specular = roof
        .textures_of(TextureKind::Specular)
        .next()
        .expect("roof has a specular slot");
    assert!(textures.get(specular.id).is_none());

    let gpu = GpuModel::new(&device, &model, &textures);
    assert_eq!(gpu.meshes.len(), model.meshes().len());
    for (uploaded, mesh) in gpu.meshes.iter().zip(model.meshes()) {
        assert_eq!(uploaded.name, mesh.name);
        assert_eq!(uploaded.num_elements as usize, mesh.indices.len());
    }
}
