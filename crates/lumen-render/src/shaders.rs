//! Built-in Phong shading program and the names it exposes.

pub const A_POSITION: &str = "aVertexPosition";
pub const A_NORMAL: &str = "aVertexNormal";
pub const A_COLOR: &str = "aVertexColor";
pub const A_TEXTURE_COORDS: &str = "aVertexTextureCoords";
pub const A_TANGENT: &str = "aVertexTangent";

pub const U_PROJECTION: &str = "uProjectionMatrix";
pub const U_MODEL_VIEW: &str = "uModelViewMatrix";
pub const U_NORMAL: &str = "uNormalMatrix";
pub const U_MATERIAL_DIFFUSE: &str = "uMaterialDiffuse";
pub const U_MATERIAL_AMBIENT: &str = "uMaterialAmbient";
pub const U_MATERIAL_SPECULAR: &str = "uMaterialSpecular";
pub const U_SHININESS: &str = "uShininess";
pub const U_LIGHT_DIFFUSE: &str = "uLightDiffuse";
pub const U_LIGHT_AMBIENT: &str = "uLightAmbient";
pub const U_LIGHT_SPECULAR: &str = "uLightSpecular";
pub const U_LIGHT_DIRECTION: &str = "uLightDirection";
pub const U_WIREFRAME: &str = "uWireframe";

/// Every attribute the scene graph knows how to feed.
pub const ATTRIBUTES: [&str; 5] = [A_POSITION, A_NORMAL, A_COLOR, A_TEXTURE_COORDS, A_TANGENT];

pub const UNIFORMS: [&str; 12] = [
    U_PROJECTION,
    U_MODEL_VIEW,
    U_NORMAL,
    U_MATERIAL_DIFFUSE,
    U_MATERIAL_AMBIENT,
    U_MATERIAL_SPECULAR,
    U_SHININESS,
    U_LIGHT_DIFFUSE,
    U_LIGHT_AMBIENT,
    U_LIGHT_SPECULAR,
    U_LIGHT_DIRECTION,
    U_WIREFRAME,
];

pub const PHONG_VERTEX: &str = r#"#version 300 es
precision highp float;

uniform mat4 uModelViewMatrix;
uniform mat4 uProjectionMatrix;
uniform mat4 uNormalMatrix;

in vec3 aVertexPosition;
in vec3 aVertexNormal;

out vec3 vNormal;
out vec3 vEyeVector;

void main(void) {
  vec4 vertex = uModelViewMatrix * vec4(aVertexPosition, 1.0);
  vNormal = vec3(uNormalMatrix * vec4(aVertexNormal, 1.0));
  vEyeVector = -vec3(vertex.xyz);
  gl_Position = uProjectionMatrix * vertex;
}
"#;

pub const PHONG_FRAGMENT: &str = r#"#version 300 es
precision highp float;

uniform float uShininess;
uniform vec3 uLightDirection;
uniform vec4 uLightAmbient;
uniform vec4 uLightDiffuse;
uniform vec4 uLightSpecular;
uniform vec4 uMaterialAmbient;
uniform vec4 uMaterialDiffuse;
uniform vec4 uMaterialSpecular;
uniform bool uWireframe;

in vec3 vNormal;
in vec3 vEyeVector;

out vec4 fragColor;

void main(void) {
  if (uWireframe) {
    fragColor = uMaterialDiffuse;
    return;
  }

  vec3 L = normalize(uLightDirection);
  vec3 N = normalize(vNormal);
  float lambertTerm = dot(N, -L);

  vec4 Ia = uLightAmbient * uMaterialAmbient;
  vec4 Id = vec4(0.0, 0.0, 0.0, 1.0);
  vec4 Is = vec4(0.0, 0.0, 0.0, 1.0);

  if (lambertTerm > 0.0) {
    Id = uLightDiffuse * uMaterialDiffuse * lambertTerm;
    vec3 E = normalize(vEyeVector);
    vec3 R = reflect(L, N);
    float specular = pow(max(dot(R, E), 0.0), uShininess);
    Is = uLightSpecular * uMaterialSpecular * specular;
  }

  fragColor = vec4(vec3(Ia + Id + Is), 1.0);
}
"#;
