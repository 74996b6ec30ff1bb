//! End-to-end generation of accessor facades through the background writer.
//!
//! Builds one facade class per accessor, writes the classes and the module
//! file through an `AsyncWriter`, then reads everything back from disk.

mod common;

use std::path::PathBuf;

use kdsl_bytecode::prelude::*;
use kdsl_bytecode::{KOTLIN_DSL_PACKAGE, module_file_for_dir};
use kdsl_concurrent::{AsyncWriter, WriterOptions};

struct GeneratedFacade {
    name: InternalName,
    header: MetadataHeader,
    bytes: Vec<u8>,
}

fn generate_facade(options: &MetadataOptions, property: &str) -> GeneratedFacade {
    let mut simple = property.to_string();
    if let Some(first) = simple.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    let name = options.facade_name(&format!("{simple}Kt"));
    let header = common::string_property_header(options, property);
    let getter = jvm_getter_signature_for(property, "(Lorg/gradle/api/Project;)Ljava/lang/String;");

    let mut class = options.public_class(&name).unwrap();
    class.visit_kotlin_metadata_annotation(&header).unwrap();
    class
        .public_static_method(&getter, None, &[], |code| {
            code.aload(0)?;
            code.ldc_string(property)?;
            code.invokeinterface(
                "org/gradle/api/Project",
                "property",
                "(Ljava/lang/String;)Ljava/lang/Object;",
            )?;
            code.checkcast("java/lang/String")?;
            code.areturn()
        })
        .unwrap();

    GeneratedFacade {
        name,
        header,
        bytes: class.into_bytes().unwrap(),
    }
}

const PROPERTIES: [&str; 3] = ["displayName", "buildDir", "version"];

#[test]
fn test_facades_and_module_round_trip_through_writer() {
    let fixture = common::OutputFixture::new();
    let options = &fixture.options;
    let facades: Vec<GeneratedFacade> = PROPERTIES
        .iter()
        .map(|p| generate_facade(options, p))
        .collect();

    let writer = AsyncWriter::with_options(WriterOptions::from(&fixture.config.writer)).unwrap();

    let package_dir = fixture.root().join(facades[0].name.package());
    let module_file = module_file_for_dir(fixture.root());
    let dirs: Vec<PathBuf> = vec![package_dir, module_file.parent().unwrap().to_path_buf()];
    let mkdirs = writer
        .submit(move || dirs.iter().try_for_each(std::fs::create_dir_all))
        .unwrap();

    let writes: Vec<_> = facades
        .iter()
        .map(|f| writer.write_file(fixture.class_path(&f.name), f.bytes.clone()).unwrap())
        .collect();
    let names: Vec<InternalName> = facades.iter().map(|f| f.name.clone()).collect();
    let module_write = writer
        .write_file(&module_file, options.module_metadata_bytes_for(&names))
        .unwrap();

    writer.close().unwrap();
    mkdirs.wait().unwrap();
    for write in writes {
        write.wait().unwrap();
    }
    module_write.wait().unwrap();

    for (facade, property) in facades.iter().zip(PROPERTIES) {
        let bytes = std::fs::read(fixture.class_path(&facade.name)).unwrap();
        assert_eq!(bytes, facade.bytes);

        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.this_class, facade.name.as_str());
        let header = class.kotlin_metadata().unwrap();
        assert_eq!(header, facade.header);
        assert_eq!(header.kind, MetadataKind::FileFacade);

        let package = KmPackage::read(&header).unwrap();
        assert!(package.functions.is_empty());
        assert_eq!(package.properties.len(), 1);
        let accessor = &package.properties[0];
        assert_eq!(accessor.name, property);
        assert_eq!(accessor.flags, PropertyFlags::READ_ONLY);
        assert_eq!(accessor.getter_flags, AccessorFlags::INLINE_GETTER);

        let getter = accessor.getter_signature.as_ref().unwrap();
        let method = class.method(&getter.name).unwrap();
        assert_eq!(method.descriptor, getter.desc);
        assert_eq!(method.code.as_ref().unwrap().max_stack, 2);
    }

    let module = ModuleMetadata::parse(&std::fs::read(&module_file).unwrap()).unwrap();
    assert_eq!(module.version, options.metadata_version);
    assert_eq!(module.packages.len(), 1);
    assert_eq!(module.packages[0].fq_name, KOTLIN_DSL_PACKAGE);
    assert_eq!(module.packages[0].file_facades, names);
}

#[test]
fn test_failed_write_does_not_block_later_writes() {
    let fixture = common::OutputFixture::new();
    let facade = generate_facade(&fixture.options, "displayName");
    let writer = AsyncWriter::start().unwrap();

    // The package directory does not exist yet.
    let missing = writer
        .write_file(fixture.class_path(&facade.name), facade.bytes.clone())
        .unwrap();
    let flat = fixture.root().join("DisplayNameKt.class");
    let written = writer.write_file(&flat, facade.bytes.clone()).unwrap();
    writer.close().unwrap();

    assert!(matches!(
        missing.wait(),
        Err(kdsl_concurrent::WriterError::Io { .. })
    ));
    written.wait().unwrap();
    assert_eq!(std::fs::read(flat).unwrap(), facade.bytes);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_pipeline() {
    let fixture = common::OutputFixture::new();
    let options = fixture.options.clone();
    let writer = AsyncWriter::start().unwrap();

    let facades: Vec<GeneratedFacade> = PROPERTIES
        .iter()
        .map(|p| generate_facade(&options, p))
        .collect();
    let names: Vec<InternalName> = facades.iter().map(|f| f.name.clone()).collect();

    let module_file = kdsl_bytecode::module_file_for(fixture.root(), "accessors");
    let module_dir = module_file.parent().unwrap().to_path_buf();
    let mkdir = writer
        .submit_async(move || std::fs::create_dir_all(module_dir))
        .await
        .unwrap();
    let module_write = writer
        .write_file_async(&module_file, options.module_metadata_bytes_for(&names))
        .await
        .unwrap();
    writer.close_async().await.unwrap();

    mkdir.await.unwrap();
    module_write.await.unwrap();
    assert!(module_file.ends_with("META-INF/accessors.kotlin_module"));

    let module = ModuleMetadata::parse(&std::fs::read(&module_file).unwrap()).unwrap();
    assert_eq!(module.packages[0].file_facades, names);
}
